//! Reading and writing of `.vol` volume textures.
//!
//! A file is a 4096 byte header block followed by the raw voxel data. The
//! header fields sit at fixed offsets in the block, all integers are little
//! endian `i32`s.
//!
//! | offset | size | field             |
//! |--------|------|-------------------|
//! | 0      | 4    | magic, `VOLU`     |
//! | 4      | 4    | version           |
//! | 8      | 256  | texture name      |
//! | 264    | 1    | wrap flag         |
//! | 268    | 4    | edge length       |
//! | 272    | 4    | channel count     |
//! | 276    | 4    | bytes per channel |

use std::convert::TryFrom;
use std::io::{Read, Write};
use std::path::Path;

use crate::volume::Volume;
use crate::{Color, Error};

pub const VOLUME_MAGIC: [u8; 4] = *b"VOLU";
pub const VOLUME_VERSION: i32 = 4;
pub const HEADER_LEN: usize = 4096;
/// Upper bound on the data block we are willing to allocate when reading
pub const MAX_VOLUME_BYTES: usize = 1 << 30;

const NAME_OFFSET: usize = 8;
const NAME_LEN: usize = 256;
const WRAP_OFFSET: usize = 264;
const SIZE_OFFSET: usize = 268;
const CHANNELS_OFFSET: usize = 272;
const BYTES_PER_CHANNEL_OFFSET: usize = 276;

/// How deviations in non-essential header fields are treated when reading
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HeaderPolicy {
    /// Unknown versions and channel widths are logged as warnings
    Lenient,
    /// Unknown versions and channel widths are errors
    Strict,
}

impl Default for HeaderPolicy {
    fn default() -> Self {
        Self::Lenient
    }
}

fn bad_header(reason: impl Into<String>) -> Error {
    Error::InvalidVolumeHeader(reason.into())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VolumeHeader {
    pub version: i32,
    pub texture_name: String,
    pub wrap: bool,
    pub volume_size: u32,
    pub num_channels: u32,
    pub bytes_per_channel: u32,
}

impl VolumeHeader {
    /// Header for an 8-bit RGB volume
    pub fn new(texture_name: &str, wrap: bool, volume_size: u32) -> Result<Self, Error> {
        check_texture_name(texture_name)?;

        Ok(Self {
            version: VOLUME_VERSION,
            texture_name: texture_name.to_owned(),
            wrap,
            volume_size,
            num_channels: 3,
            bytes_per_channel: 1,
        })
    }

    /// Length in bytes of the data block following the header
    pub fn data_len(&self) -> Result<usize, Error> {
        let size = self.volume_size as usize;
        size.checked_mul(size)
            .and_then(|s| s.checked_mul(size))
            .and_then(|s| s.checked_mul(self.num_channels as usize))
            .and_then(|s| s.checked_mul(self.bytes_per_channel as usize))
            .filter(|&len| len <= MAX_VOLUME_BYTES)
            .ok_or_else(|| {
                bad_header(format!(
                    "a {0}x{0}x{0} volume with {1} channel(s) of {2} byte(s) exceeds {3} bytes",
                    self.volume_size, self.num_channels, self.bytes_per_channel, MAX_VOLUME_BYTES
                ))
            })
    }

    pub fn write<W: Write>(&self, w: &mut W) -> Result<usize, Error> {
        check_texture_name(&self.texture_name)?;
        let volume_size = header_i32(self.volume_size, "volume size")?;
        let num_channels = header_i32(self.num_channels, "channel count")?;
        let bytes_per_channel = header_i32(self.bytes_per_channel, "bytes per channel")?;
        self.data_len()?;

        let mut block = vec![0u8; HEADER_LEN];
        block[0..4].copy_from_slice(&VOLUME_MAGIC);
        put_i32(&mut block, 4, self.version);
        block[NAME_OFFSET..NAME_OFFSET + self.texture_name.len()]
            .copy_from_slice(self.texture_name.as_bytes());
        block[WRAP_OFFSET] = u8::from(self.wrap);
        put_i32(&mut block, SIZE_OFFSET, volume_size);
        put_i32(&mut block, CHANNELS_OFFSET, num_channels);
        put_i32(&mut block, BYTES_PER_CHANNEL_OFFSET, bytes_per_channel);

        w.write_all(&block)?;
        Ok(HEADER_LEN)
    }

    /// Parses and validates a header block. Nothing is trusted until every
    /// field has been checked.
    pub fn read<R: Read>(r: &mut R, policy: HeaderPolicy) -> Result<Self, Error> {
        let mut block = vec![0u8; HEADER_LEN];
        r.read_exact(&mut block)?;

        if block[0..4] != VOLUME_MAGIC {
            return Err(bad_header("invalid magic"));
        }

        let version = get_i32(&block, 4);
        if version != VOLUME_VERSION {
            match policy {
                HeaderPolicy::Strict => {
                    return Err(bad_header(format!(
                        "version {} != {}",
                        version, VOLUME_VERSION
                    )))
                }
                HeaderPolicy::Lenient => {
                    log::warn!("bad header: version {} != {}", version, VOLUME_VERSION)
                }
            }
        }

        let name = &block[NAME_OFFSET..NAME_OFFSET + NAME_LEN];
        let name_len = name
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| bad_header("texture name is not NUL terminated"))?;
        let texture_name = std::str::from_utf8(&name[..name_len])
            .map_err(|e| bad_header(format!("texture name is not UTF-8: {}", e)))?
            .to_owned();

        let wrap = block[WRAP_OFFSET] != 0;

        let field = |offset: usize, name: &str, max: i32| -> Result<u32, Error> {
            let value = get_i32(&block, offset);
            if value <= 0 || value > max {
                return Err(bad_header(format!(
                    "{} {} is outside the range of 1-{}",
                    name, value, max
                )));
            }
            Ok(value as u32)
        };

        let volume_size = field(SIZE_OFFSET, "volume size", i32::MAX)?;
        let num_channels = field(CHANNELS_OFFSET, "channel count", 4)?;
        let bytes_per_channel = field(BYTES_PER_CHANNEL_OFFSET, "bytes per channel", 8)?;

        if bytes_per_channel != 1 {
            match policy {
                HeaderPolicy::Strict => {
                    return Err(bad_header("only byte textures supported"));
                }
                HeaderPolicy::Lenient => log::warn!(
                    "bad header: only byte textures supported, found {} bytes per channel",
                    bytes_per_channel
                ),
            }
        }

        let header = Self {
            version,
            texture_name,
            wrap,
            volume_size,
            num_channels,
            bytes_per_channel,
        };

        // Bounds the allocation made by the caller for the data block
        header.data_len()?;

        Ok(header)
    }
}

fn check_texture_name(name: &str) -> Result<(), Error> {
    if name.len() >= NAME_LEN || name.bytes().any(|b| b == 0) {
        return Err(Error::InvalidTextureName(name.to_owned()));
    }
    Ok(())
}

fn header_i32(value: u32, name: &str) -> Result<i32, Error> {
    if value == 0 {
        return Err(bad_header(format!("{} must not be 0", name)));
    }
    i32::try_from(value)
        .map_err(|_| bad_header(format!("{} {} does not fit the header", name, value)))
}

#[inline]
fn put_i32(block: &mut [u8], offset: usize, value: i32) {
    block[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

#[inline]
fn get_i32(block: &[u8], offset: usize) -> i32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&block[offset..offset + 4]);
    i32::from_le_bytes(bytes)
}

/// A header together with its raw data block
#[derive(Clone, Debug)]
pub struct VolumeFile {
    pub header: VolumeHeader,
    pub data: Vec<u8>,
}

impl VolumeFile {
    /// Packs an RGB volume
    pub fn from_volume(texture_name: &str, wrap: bool, volume: &Volume) -> Result<Self, Error> {
        Ok(Self {
            header: VolumeHeader::new(texture_name, wrap, volume.size())?,
            data: volume.to_rgb_bytes(),
        })
    }

    /// Unpacks the data as an RGB volume, which requires 3 channels of 1
    /// byte each
    pub fn to_volume(&self) -> Result<Volume, Error> {
        if self.header.num_channels != 3 || self.header.bytes_per_channel != 1 {
            return Err(bad_header(format!(
                "expected 3 channels of 1 byte, found {} channel(s) of {} byte(s)",
                self.header.num_channels, self.header.bytes_per_channel
            )));
        }

        let voxels = self
            .data
            .chunks_exact(3)
            .map(|px| Color::new(px[0], px[1], px[2]))
            .collect();
        Volume::from_raw(self.header.volume_size, voxels)
    }

    pub fn write<W: Write>(&self, w: &mut W) -> Result<usize, Error> {
        let expected = self.header.data_len()?;
        if self.data.len() != expected {
            return Err(Error::SizeMismatch(crate::errors::SizeMismatch {
                expected,
                actual: self.data.len(),
            }));
        }

        let mut written = self.header.write(w)?;
        w.write_all(&self.data)?;
        written += self.data.len();

        Ok(written)
    }

    pub fn read<R: Read>(r: &mut R, policy: HeaderPolicy) -> Result<Self, Error> {
        let header = VolumeHeader::read(r, policy)?;

        let mut data = vec![0u8; header.data_len()?];
        r.read_exact(&mut data)?;

        Ok(Self { header, data })
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        if let Some(parent_path) = path.parent() {
            std::fs::create_dir_all(parent_path)?;
        }

        let mut w = std::io::BufWriter::new(std::fs::File::create(path)?);
        self.write(&mut w)?;
        w.flush()?;
        Ok(())
    }

    pub fn open<P: AsRef<Path>>(path: P, policy: HeaderPolicy) -> Result<Self, Error> {
        let mut r = std::io::BufReader::new(std::fs::File::open(path)?);
        Self::read(&mut r, policy)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn header_block(size: i32, channels: i32, bpc: i32, version: i32) -> Vec<u8> {
        let mut block = vec![0u8; HEADER_LEN];
        block[0..4].copy_from_slice(b"VOLU");
        put_i32(&mut block, 4, version);
        block[NAME_OFFSET..NAME_OFFSET + 4].copy_from_slice(b"wood");
        block[WRAP_OFFSET] = 1;
        put_i32(&mut block, SIZE_OFFSET, size);
        put_i32(&mut block, CHANNELS_OFFSET, channels);
        put_i32(&mut block, BYTES_PER_CHANNEL_OFFSET, bpc);
        block
    }

    #[test]
    fn write_rejects_fields_outside_i32() {
        let mut header = VolumeHeader::new("wood", true, 2).unwrap();
        header.volume_size = i32::MAX as u32 + 1;

        let mut buffer = Vec::new();
        assert!(matches!(
            header.write(&mut buffer),
            Err(Error::InvalidVolumeHeader(_))
        ));

        let mut header = VolumeHeader::new("wood", true, 2).unwrap();
        header.num_channels = u32::MAX;
        assert!(matches!(
            header.write(&mut buffer),
            Err(Error::InvalidVolumeHeader(_))
        ));

        let mut header = VolumeHeader::new("wood", true, 2).unwrap();
        header.bytes_per_channel = 0;
        assert!(matches!(
            header.write(&mut buffer),
            Err(Error::InvalidVolumeHeader(_))
        ));

        // Nothing is written for a rejected header
        assert!(buffer.is_empty());
    }

    #[test]
    fn header_layout() {
        let header = VolumeHeader::new("TEST.vol", true, 128).unwrap();
        let mut buffer = Vec::new();
        assert_eq!(header.write(&mut buffer).unwrap(), HEADER_LEN);

        assert_eq!(buffer.len(), 4096);
        assert_eq!(&buffer[0..4], b"VOLU");
        assert_eq!(&buffer[4..8], &4i32.to_le_bytes());
        assert_eq!(&buffer[8..16], b"TEST.vol");
        assert_eq!(buffer[16], 0);
        assert_eq!(buffer[264], 1);
        assert_eq!(&buffer[268..272], &128i32.to_le_bytes());
        assert_eq!(&buffer[272..276], &3i32.to_le_bytes());
        assert_eq!(&buffer[276..280], &1i32.to_le_bytes());
        assert!(buffer[280..].iter().all(|&b| b == 0));

        let read =
            VolumeHeader::read(&mut std::io::Cursor::new(&buffer), HeaderPolicy::Strict).unwrap();
        assert_eq!(read, header);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut block = header_block(2, 3, 1, 4);
        block[3] = b'X';
        for &policy in &[HeaderPolicy::Lenient, HeaderPolicy::Strict] {
            assert!(matches!(
                VolumeHeader::read(&mut block.as_slice(), policy),
                Err(Error::InvalidVolumeHeader(_))
            ));
        }
    }

    #[test]
    fn version_mismatch_depends_on_policy() {
        let block = header_block(2, 3, 1, 3);

        let header = VolumeHeader::read(&mut block.as_slice(), HeaderPolicy::Lenient).unwrap();
        assert_eq!(header.version, 3);
        assert_eq!(header.texture_name, "wood");
        assert!(header.wrap);

        assert!(VolumeHeader::read(&mut block.as_slice(), HeaderPolicy::Strict).is_err());
    }

    #[test]
    fn wide_channels_depend_on_policy() {
        let block = header_block(2, 3, 2, 4);

        let header = VolumeHeader::read(&mut block.as_slice(), HeaderPolicy::Lenient).unwrap();
        assert_eq!(header.data_len().unwrap(), 8 * 3 * 2);
        assert!(VolumeHeader::read(&mut block.as_slice(), HeaderPolicy::Strict).is_err());

        let mut file = block;
        file.extend(std::iter::repeat(7u8).take(48));
        let vf = VolumeFile::read(&mut file.as_slice(), HeaderPolicy::Lenient).unwrap();
        assert_eq!(vf.data.len(), 48);
        assert!(vf.to_volume().is_err());
    }

    #[test]
    fn rejects_untrusted_sizes() {
        let cases = [
            (0, 3, 1),
            (-4, 3, 1),
            (2, 0, 1),
            (2, 9, 1),
            (2, 3, 0),
            (4096, 3, 1),
        ];
        for &(size, channels, bpc) in &cases {
            let block = header_block(size, channels, bpc, 4);
            assert!(
                VolumeHeader::read(&mut block.as_slice(), HeaderPolicy::Lenient).is_err(),
                "{}x{}x{} should be rejected",
                size,
                channels,
                bpc
            );
        }
    }

    #[test]
    fn rejects_unterminated_name() {
        let mut block = header_block(2, 3, 1, 4);
        for b in &mut block[NAME_OFFSET..NAME_OFFSET + NAME_LEN] {
            *b = b'a';
        }
        assert!(VolumeHeader::read(&mut block.as_slice(), HeaderPolicy::Lenient).is_err());
    }

    #[test]
    fn rejects_bad_names_on_write() {
        assert!(VolumeHeader::new(&"a".repeat(256), true, 2).is_err());
        assert!(VolumeHeader::new("nul\0name", true, 2).is_err());
        assert!(VolumeHeader::new(&"a".repeat(255), true, 2).is_ok());
    }

    #[test]
    fn truncated_data_is_an_io_error() {
        let mut file = header_block(2, 3, 1, 4);
        file.extend_from_slice(&[0u8; 10]);
        assert!(matches!(
            VolumeFile::read(&mut file.as_slice(), HeaderPolicy::Strict),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn volume_survives_a_file() {
        let mut vol = Volume::new(3).unwrap();
        vol.set(2, 1, 0, Color::new(1, 2, 3));
        vol.set(0, 2, 2, Color::new(250, 128, 9));

        let file = VolumeFile::from_volume("solid", false, &vol).unwrap();
        let mut buffer = Vec::new();
        assert_eq!(file.write(&mut buffer).unwrap(), HEADER_LEN + 27 * 3);

        let read = VolumeFile::read(&mut buffer.as_slice(), HeaderPolicy::Strict).unwrap();
        assert_eq!(read.header.texture_name, "solid");
        assert!(!read.header.wrap);

        let back = read.to_volume().unwrap();
        assert_eq!(back.size(), 3);
        assert_eq!(back.as_slice(), vol.as_slice());
    }
}
