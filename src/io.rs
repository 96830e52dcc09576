use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};

pub trait ReadSeek: Read + Seek {
}

impl<T: Read + Seek> ReadSeek for T {}

pub trait WriteSeek: Write + Seek {
}

impl<T: Write + Seek> WriteSeek for T {}

/// Byte order of scalar fields in a serialized file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

/// Fields are aligned to this many bytes after variable-length arrays.
pub const ALIGNMENT: u64 = 4;

macro_rules! by_endian {
    ($endian:expr, $e:ident . $method:ident ( $($arg:expr),* )) => {
        match $endian {
            Endian::Little => $e.$method::<LittleEndian>($($arg),*),
            Endian::Big => $e.$method::<BigEndian>($($arg),*),
        }
    };
}

pub struct EndianReader<R> {
    inner: R,
    endian: Endian,
}

impl<R: ReadSeek> EndianReader<R> {
    pub fn new(inner: R, endian: Endian) -> Self {
        Self { inner, endian }
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn read_u8(&mut self) -> std::io::Result<u8> {
        self.inner.read_u8()
    }

    pub fn read_u32(&mut self) -> std::io::Result<u32> {
        let r = &mut self.inner;
        by_endian!(self.endian, r.read_u32())
    }

    pub fn read_i32(&mut self) -> std::io::Result<i32> {
        let r = &mut self.inner;
        by_endian!(self.endian, r.read_i32())
    }

    pub fn read_f32(&mut self) -> std::io::Result<f32> {
        let r = &mut self.inner;
        by_endian!(self.endian, r.read_f32())
    }

    /// An `i32` length followed by that many bytes.
    pub fn read_byte_array(&mut self) -> std::io::Result<Vec<u8>> {
        let len = self.read_i32()?;
        let len = usize::try_from(len).map_err(|_| {
            std::io::Error::new(ErrorKind::InvalidData, format!("negative array length {len}"))
        })?;
        let mut buf = Vec::new();
        (&mut self.inner).take(len as u64).read_to_end(&mut buf)?;
        if buf.len() != len {
            return Err(std::io::Error::new(
                ErrorKind::UnexpectedEof,
                format!("array of {len} bytes ends after {}", buf.len()),
            ));
        }
        Ok(buf)
    }

    /// Skip forward to the next multiple of [`ALIGNMENT`].
    pub fn align(&mut self) -> std::io::Result<()> {
        let pos = self.inner.stream_position()?;
        let aligned = pos.next_multiple_of(ALIGNMENT);
        if aligned != pos {
            self.inner.seek(SeekFrom::Start(aligned))?;
        }
        Ok(())
    }
}

pub struct EndianWriter<W> {
    inner: W,
    endian: Endian,
}

impl<W: WriteSeek> EndianWriter<W> {
    pub fn new(inner: W, endian: Endian) -> Self {
        Self { inner, endian }
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn write_u8(&mut self, v: u8) -> std::io::Result<()> {
        self.inner.write_u8(v)
    }

    pub fn write_u32(&mut self, v: u32) -> std::io::Result<()> {
        let w = &mut self.inner;
        by_endian!(self.endian, w.write_u32(v))
    }

    pub fn write_i32(&mut self, v: i32) -> std::io::Result<()> {
        let w = &mut self.inner;
        by_endian!(self.endian, w.write_i32(v))
    }

    pub fn write_f32(&mut self, v: f32) -> std::io::Result<()> {
        let w = &mut self.inner;
        by_endian!(self.endian, w.write_f32(v))
    }

    pub fn write_byte_array(&mut self, data: &[u8]) -> std::io::Result<()> {
        let len = i32::try_from(data.len()).map_err(|_| {
            std::io::Error::new(
                ErrorKind::InvalidInput,
                format!("array of {} bytes is too long", data.len()),
            )
        })?;
        self.write_i32(len)?;
        self.inner.write_all(data)
    }

    /// Pad with zeros up to the next multiple of [`ALIGNMENT`].
    pub fn align(&mut self) -> std::io::Result<()> {
        let pos = self.inner.stream_position()?;
        let pad = (pos.next_multiple_of(ALIGNMENT) - pos) as usize;
        self.inner.write_all(&[0; ALIGNMENT as usize][..pad])
    }
}
