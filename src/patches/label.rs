use crate::grid::{Grid, neighbors4};

/// Connected-component labels: 0 is background, 1..=count one patch each.
#[derive(Clone, Debug)]
pub struct Labels {
    pub labels: Grid<u32>,
    pub count: usize,
}

/// 4-connected labeling of active cells by stack flood fill, seeding
/// patches in row-major order.
pub fn label_patches(grid: &Grid<bool>) -> Labels {
    let w = grid.w;
    let h = grid.h;
    let mut labels = Grid::<u32>::new(w, h);
    let mut count = 0u32;
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for y in 0..h {
        for x in 0..w {
            if !grid.get(x, y) || labels.get(x, y) != 0 {
                continue;
            }
            count += 1;
            labels.set(x, y, count);
            stack.push((x, y));
            while let Some((cx, cy)) = stack.pop() {
                for (nx, ny) in neighbors4(cx, cy, w, h) {
                    if grid.get(nx, ny) && labels.get(nx, ny) == 0 {
                        labels.set(nx, ny, count);
                        stack.push((nx, ny));
                    }
                }
            }
        }
    }

    Labels {
        labels,
        count: count as usize,
    }
}
