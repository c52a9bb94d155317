use std::{
    fs::{File, OpenOptions},
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use nalgebra::{allocator::Allocator, DefaultAllocator, DimName, OPoint, OVector};

use crate::{
    bounding_box::AABBox,
    error::SpaceTreeError,
    misc::{FieldValue, FloatingPoint},
    primitive::Primitive,
    space_tree::SpaceTreeNode,
    tree::Tree,
};

const HEADER_BYTES: usize = 16;

/// Direction a box file was opened in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoxFileMode {
    /// The file already existed, its header has been read back
    Input,
    /// The file has been created and its header written
    Output,
}

#[derive(Debug)]
enum Stream {
    Input(BufReader<File>),
    Output(BufWriter<File>),
}

/// Binary file of axis aligned boxes.
///
/// The header holds two little endian `u64`s, the dimension and the byte size of one coordinate.
/// Each record then stores the lower corner followed by the lengths, one little endian
/// float of the coordinate size per axis.
#[derive(Debug)]
pub struct BoxFile {
    stream: Stream,
    dimension: usize,
    coordinate_bytes: usize,
}

impl BoxFile {
    /// Open `path` for reading if it exists, otherwise create it for writing.
    ///
    /// `dimension` and `coordinate_bytes` describe the header of a new file,
    /// an existing file keeps the header it was written with.
    pub fn open<P: AsRef<Path>>(
        path: P,
        dimension: usize,
        coordinate_bytes: usize,
    ) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::open_input(path)
        } else {
            Self::create_output(path, dimension, coordinate_bytes)
        }
    }

    fn open_input(path: &Path) -> anyhow::Result<Self> {
        let mut reader = BufReader::new(File::open(path).map_err(SpaceTreeError::from)?);
        let mut header = [0u8; HEADER_BYTES];
        reader
            .read_exact(&mut header)
            .map_err(SpaceTreeError::from)?;
        let (dimension, coordinate_bytes) = header.split_at(8);
        let dimension = u64::from_le_bytes(dimension.try_into()?);
        let coordinate_bytes = u64::from_le_bytes(coordinate_bytes.try_into()?);
        let (dimension, coordinate_bytes) = validate_header(dimension, coordinate_bytes)?;
        log::debug!(
            "opened box file {} ({}D, {} byte coordinates)",
            path.display(),
            dimension,
            coordinate_bytes
        );
        Ok(Self {
            stream: Stream::Input(reader),
            dimension,
            coordinate_bytes,
        })
    }

    fn create_output(
        path: &Path,
        dimension: usize,
        coordinate_bytes: usize,
    ) -> anyhow::Result<Self> {
        let (dimension, coordinate_bytes) =
            validate_header(dimension as u64, coordinate_bytes as u64)?;
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(SpaceTreeError::from)?;
        let mut writer = BufWriter::new(file);
        for field in [dimension as u64, coordinate_bytes as u64] {
            writer
                .write_all(&field.to_le_bytes())
                .map_err(SpaceTreeError::from)?;
        }
        log::debug!(
            "created box file {} ({}D, {} byte coordinates)",
            path.display(),
            dimension,
            coordinate_bytes
        );
        Ok(Self {
            stream: Stream::Output(writer),
            dimension,
            coordinate_bytes,
        })
    }

    pub fn mode(&self) -> BoxFileMode {
        match self.stream {
            Stream::Input(_) => BoxFileMode::Input,
            Stream::Output(_) => BoxFileMode::Output,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn coordinate_bytes(&self) -> usize {
        self.coordinate_bytes
    }

    /// Append a box record.
    pub fn write_box<T: FloatingPoint, D: DimName>(
        &mut self,
        aabb: &AABBox<T, D>,
    ) -> anyhow::Result<()>
    where
        DefaultAllocator: Allocator<D>,
    {
        self.check_dimension::<D>()?;
        let coordinate_bytes = self.coordinate_bytes;
        let Stream::Output(writer) = &mut self.stream else {
            anyhow::bail!("box file was opened for reading");
        };

        let mut record = Vec::with_capacity(2 * D::dim() * coordinate_bytes);
        for value in aabb.base().iter().chain(aabb.lengths().iter()) {
            let value = value.to_f64_lossy();
            if coordinate_bytes == 4 {
                record.extend_from_slice(&(value as f32).to_le_bytes());
            } else {
                record.extend_from_slice(&value.to_le_bytes());
            }
        }
        writer.write_all(&record).map_err(SpaceTreeError::from)?;
        Ok(())
    }

    /// Append the extent of a primitive.
    pub fn write_primitive<T: FloatingPoint, D: DimName>(
        &mut self,
        primitive: &Primitive<T, D>,
    ) -> anyhow::Result<()>
    where
        DefaultAllocator: Allocator<D>,
    {
        self.write_box(&primitive.to_aabb())
    }

    /// Append every leaf of the tree in traversal order, returning the number of records.
    pub fn write_leaves<T: FloatingPoint, D: DimName, V: FieldValue>(
        &mut self,
        node: &SpaceTreeNode<T, D, V>,
    ) -> anyhow::Result<usize>
    where
        DefaultAllocator: Allocator<D>,
    {
        let leaves = node.leaves();
        for leaf in leaves.iter() {
            self.write_primitive(leaf.primitive())?;
        }
        Ok(leaves.len())
    }

    /// Read the next box record, `None` at the end of the file.
    pub fn read_box<T: FloatingPoint, D: DimName>(&mut self) -> anyhow::Result<Option<AABBox<T, D>>>
    where
        DefaultAllocator: Allocator<D>,
    {
        self.check_dimension::<D>()?;
        let coordinate_bytes = self.coordinate_bytes;
        let Stream::Input(reader) = &mut self.stream else {
            anyhow::bail!("box file was opened for writing");
        };

        let mut record = vec![0u8; 2 * D::dim() * coordinate_bytes];
        let mut filled = 0;
        while filled < record.len() {
            let n = reader
                .read(&mut record[filled..])
                .map_err(SpaceTreeError::from)?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        if filled == 0 {
            return Ok(None);
        }
        if filled < record.len() {
            return Err(SpaceTreeError::Io(std::io::ErrorKind::UnexpectedEof.into()).into());
        }

        let values = record
            .chunks_exact(coordinate_bytes)
            .map(|chunk| -> anyhow::Result<T> {
                let value = if coordinate_bytes == 4 {
                    f32::from_le_bytes(chunk.try_into()?) as f64
                } else {
                    f64::from_le_bytes(chunk.try_into()?)
                };
                Ok(T::constant(value))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        let (base, lengths) = values.split_at(D::dim());
        let aabb = AABBox::new(
            OPoint::from(OVector::<T, D>::from_column_slice(base)),
            OVector::<T, D>::from_column_slice(lengths),
        )?;
        Ok(Some(aabb))
    }

    /// Read every remaining box record.
    pub fn read_boxes<T: FloatingPoint, D: DimName>(&mut self) -> anyhow::Result<Vec<AABBox<T, D>>>
    where
        DefaultAllocator: Allocator<D>,
    {
        let mut boxes = vec![];
        while let Some(aabb) = self.read_box()? {
            boxes.push(aabb);
        }
        Ok(boxes)
    }

    /// Flush buffered records to disk.
    pub fn flush(&mut self) -> anyhow::Result<()> {
        if let Stream::Output(writer) = &mut self.stream {
            writer.flush().map_err(SpaceTreeError::from)?;
        }
        Ok(())
    }

    fn check_dimension<D: DimName>(&self) -> anyhow::Result<()> {
        if D::dim() != self.dimension {
            return Err(SpaceTreeError::Geometry(format!(
                "box file stores {}D boxes, got {}D",
                self.dimension,
                D::dim()
            ))
            .into());
        }
        Ok(())
    }
}

fn validate_header(dimension: u64, coordinate_bytes: u64) -> anyhow::Result<(usize, usize)> {
    if dimension == 0 || !matches!(coordinate_bytes, 4 | 8) {
        return Err(SpaceTreeError::InvalidHeader {
            dimension,
            coordinate_bytes,
        }
        .into());
    }
    Ok((usize::try_from(dimension)?, coordinate_bytes as usize))
}
