//! The pixel surface the module draws into.
//!
//! The host owns the pixels; the module sees them through a
//! [`SurfaceDescriptor`]. Channel order is RGBA, rows are tightly packed.
//! The host never interprets the contents: it hands the finished
//! [`Surface`] to whatever presents it.

/// Raw view of a [`Surface`], passed across the module ABI.
#[repr(C)]
#[derive(Debug)]
pub struct SurfaceDescriptor {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Bytes per pixel (4 for RGBA8).
    pub bytes_per_pixel: u32,
    /// Total length of `pixels` in bytes.
    pub byte_len: u64,
    /// First byte of the top-left pixel.
    pub pixels: *mut u8,
}

/// Owned, fixed-size pixel buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    bytes_per_pixel: u32,
    pixels: Vec<u8>,
}

impl Surface {
    /// Allocate a zeroed surface.
    pub fn new(width: u32, height: u32, bytes_per_pixel: u32) -> Self {
        let len = width as usize * height as usize * bytes_per_pixel as usize;
        Self {
            width,
            height,
            bytes_per_pixel,
            pixels: vec![0; len],
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per pixel.
    pub fn bytes_per_pixel(&self) -> u32 {
        self.bytes_per_pixel
    }

    /// Bytes per row.
    pub fn pitch(&self) -> usize {
        self.width as usize * self.bytes_per_pixel as usize
    }

    /// Pixel bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Mutable pixel bytes.
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Build the ABI view of this surface.
    ///
    /// The descriptor borrows nothing; it is valid until the surface is
    /// dropped or reallocated, which never happens while the host runs.
    pub fn descriptor(&mut self) -> SurfaceDescriptor {
        SurfaceDescriptor {
            width: self.width,
            height: self.height,
            bytes_per_pixel: self.bytes_per_pixel,
            byte_len: self.pixels.len() as u64,
            pixels: self.pixels.as_mut_ptr(),
        }
    }
}
