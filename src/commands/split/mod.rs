mod classifier;
mod labels;
mod metadata;
mod output_assembly;
mod run;
mod segmentation;
mod text_locator;

pub use classifier::{ClassificationHit, ClassificationStrategy, DepartmentClassifier};
pub use metadata::MetadataExtractor;
pub use run::{ensure_processable, run};
pub use segmentation::{classify_pages, fold_classifications};
pub use text_locator::TextLocator;
