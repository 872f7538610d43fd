/// A byte buffer that holds a mutable or immutable byte slice.
///
/// Decoders wrap the caller's input as `Immutable` once its length has been
/// checked against the format minimum; encoders wrap a freshly allocated
/// output as `Mutable`. All offsets are absolute from the start of the slice.
#[derive(Debug)]
pub enum Buffer<'a> {
    Immutable(&'a [u8]),
    Mutable(&'a mut [u8]),
}

impl Buffer<'_> {
    /// Access the buffer as an immutable slice of bytes.
    pub fn as_slice(&self) -> &[u8] {
        match &self {
            Buffer::Immutable(packet) => packet,
            Buffer::Mutable(packet) => packet,
        }
    }

    /// Get N bytes from the packet at a given byte offset.
    pub fn get_bytes<const N: usize>(&self, offset: usize) -> [u8; N] {
        core::array::from_fn(|i| self.read(offset + i))
    }

    /// Get a big-endian `u16` at a given byte offset.
    pub fn get_u16(&self, offset: usize) -> u16 {
        u16::from_be_bytes(self.get_bytes(offset))
    }

    /// Get a big-endian `u32` at a given byte offset.
    pub fn get_u32(&self, offset: usize) -> u32 {
        u32::from_be_bytes(self.get_bytes(offset))
    }

    /// Set N bytes in the packet at a given offset.
    pub fn set_bytes<const N: usize>(&mut self, offset: usize, bytes: [u8; N]) {
        for (i, b) in bytes.into_iter().enumerate() {
            *self.write(offset + i) = b;
        }
    }

    /// Set a big-endian `u16` at a given byte offset.
    pub fn set_u16(&mut self, offset: usize, val: u16) {
        self.set_bytes(offset, val.to_be_bytes());
    }

    /// Set a big-endian `u32` at a given byte offset.
    pub fn set_u32(&mut self, offset: usize, val: u32) {
        self.set_bytes(offset, val.to_be_bytes());
    }

    /// Copy a variable length slice into the packet at a given offset.
    pub fn set_slice(&mut self, offset: usize, vals: &[u8]) {
        self.as_slice_mut()[offset..offset + vals.len()].copy_from_slice(vals);
    }

    /// Get the value at a given offset.
    pub fn read(&self, offset: usize) -> u8 {
        match &self {
            Buffer::Immutable(packet) => packet[offset],
            Buffer::Mutable(packet) => packet[offset],
        }
    }

    /// Set the value at a given offset.
    pub fn write(&mut self, offset: usize) -> &mut u8 {
        match self {
            Buffer::Immutable(_) => panic!("write operation called on readonly buffer"),
            Buffer::Mutable(packet) => &mut packet[offset],
        }
    }

    /// Access the buffer as a mutable slice of bytes.
    pub fn as_slice_mut(&mut self) -> &mut [u8] {
        match self {
            Buffer::Immutable(_) => panic!("write operation called on readonly buffer"),
            Buffer::Mutable(packet) => packet,
        }
    }
}
