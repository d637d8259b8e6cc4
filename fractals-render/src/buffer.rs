use fractals_core::TileResult;
use tracing::debug;

/// Destination for finished tiles.
pub trait FrameSink {
    /// Place one tile at its absolute origin.
    fn write_tile(&mut self, tile: &TileResult);
}

/// An RGBA pixel surface assembled from tiles as they arrive.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    /// RGBA pixel data, 4 bytes per pixel, row-major order.
    pixels: Vec<u8>,
    revision: u64,
}

impl FrameBuffer {
    /// Create a new buffer filled with black (opaque).
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: black_opaque(width, height),
            revision: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Bumped on every successful write; lets a presenter skip re-uploads.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Reallocate for a new size. Existing content is discarded.
    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels = black_opaque(width, height);
        self.revision += 1;
    }

    /// Copy a tile's RGBA data into place. Returns `false`, leaving the buffer
    /// untouched, when the tile does not fit.
    pub fn blit(&mut self, tile: &TileResult) -> bool {
        let fits = tile.origin_x + tile.width <= self.width
            && tile.origin_y + tile.height <= self.height
            && tile.pixels.len() == tile.width as usize * tile.height as usize * 4;
        if !fits {
            return false;
        }

        let stride = self.width as usize * 4;
        let row_len = tile.width as usize * 4;
        for (row, src) in tile.pixels.chunks_exact(row_len).enumerate() {
            let dst_start = (tile.origin_y as usize + row) * stride + tile.origin_x as usize * 4;
            self.pixels[dst_start..dst_start + row_len].copy_from_slice(src);
        }
        self.revision += 1;
        true
    }
}

impl FrameSink for FrameBuffer {
    fn write_tile(&mut self, tile: &TileResult) {
        if !self.blit(tile) {
            debug!(
                tile_index = tile.tile_index,
                tile_w = tile.width,
                tile_h = tile.height,
                frame_w = self.width,
                frame_h = self.height,
                "Dropping tile that no longer fits the frame"
            );
        }
    }
}

fn black_opaque(width: u32, height: u32) -> Vec<u8> {
    let mut pixels = vec![0u8; width as usize * height as usize * 4];
    for chunk in pixels.chunks_exact_mut(4) {
        chunk[3] = 255;
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn tile(origin_y: u32, width: u32, height: u32, rgba: [u8; 4]) -> TileResult {
        TileResult {
            pixels: rgba.repeat((width * height) as usize),
            origin_x: 0,
            origin_y,
            width,
            height,
            tile_index: 0,
            full_res: true,
            elapsed: Duration::ZERO,
            worker_id: 0,
        }
    }

    #[test]
    fn new_buffer_is_black_opaque() {
        let buf = FrameBuffer::new(4, 4);
        assert_eq!(buf.pixels().len(), 4 * 4 * 4);
        for chunk in buf.pixels().chunks_exact(4) {
            assert_eq!(chunk, &[0, 0, 0, 255]);
        }
    }

    #[test]
    fn blit_writes_band_rows() {
        let mut buf = FrameBuffer::new(8, 8);
        buf.write_tile(&tile(2, 8, 2, [255, 0, 0, 255]));
        assert_eq!(buf.revision(), 1);

        let inside = (2 * 8 + 5) * 4;
        assert_eq!(&buf.pixels()[inside..inside + 4], &[255, 0, 0, 255]);
        let after = (4 * 8) * 4;
        assert_eq!(&buf.pixels()[after..after + 4], &[0, 0, 0, 255]);
        assert_eq!(&buf.pixels()[0..4], &[0, 0, 0, 255]);
    }

    #[test]
    fn later_tile_overwrites_earlier() {
        let mut buf = FrameBuffer::new(4, 4);
        buf.write_tile(&tile(0, 4, 2, [0, 0, 255, 255]));
        buf.write_tile(&tile(0, 4, 2, [9, 9, 9, 255]));
        assert_eq!(&buf.pixels()[0..4], &[9, 9, 9, 255]);
        assert_eq!(buf.revision(), 2);
    }

    #[test]
    fn stale_tile_after_resize_is_skipped() {
        let mut buf = FrameBuffer::new(8, 8);
        buf.resize(4, 4);
        let rev = buf.revision();
        buf.write_tile(&tile(4, 8, 4, [1, 2, 3, 255]));
        assert_eq!(buf.revision(), rev);
        assert!(buf.pixels().chunks_exact(4).all(|px| px == [0, 0, 0, 255]));
    }

    #[test]
    fn short_pixel_buffer_is_rejected() {
        let mut buf = FrameBuffer::new(4, 4);
        let mut t = tile(0, 4, 2, [1, 1, 1, 255]);
        t.pixels.truncate(8);
        assert!(!buf.blit(&t));
    }
}
