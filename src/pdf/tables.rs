use super::{BoundingBox, LayoutBlock, TableGrid};

struct BlockRow<'a> {
    band: BoundingBox,
    blocks: Vec<&'a LayoutBlock>,
}

/// Rebuilds table grids from layout blocks. Blocks whose vertical extents
/// overlap form one row; runs of consecutive multi-cell rows form one table.
pub fn reconstruct_tables(blocks: &[LayoutBlock]) -> Vec<TableGrid> {
    let mut ordered = blocks.iter().collect::<Vec<&LayoutBlock>>();
    ordered.sort_by(|left, right| {
        left.bbox
            .top
            .total_cmp(&right.bbox.top)
            .then(left.bbox.x0.total_cmp(&right.bbox.x0))
    });

    let mut rows = Vec::<BlockRow<'_>>::new();
    for block in ordered {
        match rows.last_mut() {
            Some(row) if row.band.vertically_overlaps(&block.bbox) => {
                row.band.top = row.band.top.min(block.bbox.top);
                row.band.bottom = row.band.bottom.max(block.bbox.bottom);
                row.blocks.push(block);
            }
            _ => rows.push(BlockRow {
                band: block.bbox,
                blocks: vec![block],
            }),
        }
    }

    let mut tables = Vec::<TableGrid>::new();
    let mut current = TableGrid::new();
    for mut row in rows {
        if row.blocks.len() < 2 {
            flush_table(&mut tables, &mut current);
            continue;
        }

        row.blocks
            .sort_by(|left, right| left.bbox.x0.total_cmp(&right.bbox.x0));
        current.push(row.blocks.iter().map(|block| cell_text(block)).collect());
    }
    flush_table(&mut tables, &mut current);

    tables
}

fn cell_text(block: &LayoutBlock) -> Option<String> {
    let text = block.lines.join("\n");
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn flush_table(tables: &mut Vec<TableGrid>, current: &mut TableGrid) {
    if current.is_empty() {
        return;
    }

    let columns = current.iter().map(Vec::len).max().unwrap_or(0);
    let mut table = std::mem::take(current);
    for row in &mut table {
        row.resize(columns, None);
    }
    tables.push(table);
}
