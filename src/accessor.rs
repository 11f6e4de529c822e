//! Accessor decoding: typed, possibly strided views of a buffer turned into
//! plain vectors.

use crate::document::{Accessor, ComponentType, Document, ElementType};
use crate::error::{lookup, ImportError, Result, TableKind};

/// Component types that are legal for index data, all widened to `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    U8,
    U16,
    U32,
}

impl IndexType {
    pub fn size(self) -> usize {
        match self {
            IndexType::U8 => 1,
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }

    /// Reads one little-endian index from the front of `bytes`.
    pub fn read(self, bytes: &[u8]) -> u32 {
        match self {
            IndexType::U8 => bytes[0] as u32,
            IndexType::U16 => u16::from_le_bytes([bytes[0], bytes[1]]) as u32,
            IndexType::U32 => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        }
    }
}

impl TryFrom<ComponentType> for IndexType {
    type Error = ImportError;

    fn try_from(component: ComponentType) -> Result<Self> {
        match component {
            ComponentType::U8 => Ok(IndexType::U8),
            ComponentType::U16 => Ok(IndexType::U16),
            ComponentType::U32 => Ok(IndexType::U32),
            other => Err(ImportError::format(format!(
                "component type {} is not valid for index data",
                other.code()
            ))),
        }
    }
}

fn element_size(accessor: &Accessor) -> Result<usize> {
    let component = ComponentType::from_code(accessor.component_type)?;
    Ok(component.size() * accessor.element_type.components())
}

/// Returns the bytes of buffer view `view_index`, bounds checked against its buffer.
fn view_bytes(document: &Document, view_index: usize) -> Result<(&[u8], Option<usize>)> {
    let view = lookup(&document.buffer_views, TableKind::BufferView, view_index)?;
    let buffer = lookup(&document.buffers, TableKind::Buffer, view.buffer)?;
    let end = view
        .byte_offset
        .checked_add(view.byte_length)
        .filter(|end| *end <= buffer.len())
        .ok_or_else(|| {
            ImportError::format(format!(
                "buffer view {} ({} bytes at offset {}) exceeds buffer {} ({} bytes)",
                view_index,
                view.byte_length,
                view.byte_offset,
                view.buffer,
                buffer.len()
            ))
        })?;
    Ok((&buffer[view.byte_offset..end], view.byte_stride))
}

/// Checks that `count` elements of `elem_size` bytes, `stride` apart and starting at
/// `offset`, fit in a view of `view_len` bytes.
fn check_range(
    offset: usize,
    count: usize,
    stride: usize,
    elem_size: usize,
    view_len: usize,
) -> Result<()> {
    if count == 0 {
        return Ok(());
    }
    let end = (count - 1)
        .checked_mul(stride)
        .and_then(|n| n.checked_add(offset))
        .and_then(|n| n.checked_add(elem_size));
    match end {
        Some(end) if end <= view_len => Ok(()),
        _ => Err(ImportError::format(format!(
            "{} elements of {} bytes (stride {}, offset {}) do not fit in a {} byte view",
            count, elem_size, stride, offset, view_len
        ))),
    }
}

/// Copies the accessor's elements into a tightly packed byte vector,
/// applying its sparse block if it has one.
pub fn read_accessor_data(document: &Document, accessor: &Accessor) -> Result<Vec<u8>> {
    let elem_size = element_size(accessor)?;
    let count = accessor.count;

    let mut data = match accessor.buffer_view {
        Some(view_index) => {
            let (bytes, stride) = view_bytes(document, view_index)?;
            let stride = stride.unwrap_or(elem_size);
            if stride < elem_size {
                return Err(ImportError::format(format!(
                    "buffer view {} stride {} is smaller than the {} byte element",
                    view_index, stride, elem_size
                )));
            }
            check_range(accessor.byte_offset, count, stride, elem_size, bytes.len())?;

            let mut data = vec![0u8; count * elem_size];
            for i in 0..count {
                let src = accessor.byte_offset + i * stride;
                let dst = i * elem_size;
                data[dst..dst + elem_size].copy_from_slice(&bytes[src..src + elem_size]);
            }
            data
        }
        None => {
            let len = count.checked_mul(elem_size).ok_or_else(|| {
                ImportError::format(format!("accessor of {} elements is too large", count))
            })?;
            vec![0u8; len]
        }
    };

    if let Some(sparse) = &accessor.sparse {
        let index_type =
            IndexType::try_from(ComponentType::from_code(sparse.indices_component_type)?)?;

        let (index_bytes, _) = view_bytes(document, sparse.indices_view)?;
        check_range(
            sparse.indices_byte_offset,
            sparse.count,
            index_type.size(),
            index_type.size(),
            index_bytes.len(),
        )?;
        let (value_bytes, _) = view_bytes(document, sparse.values_view)?;
        check_range(
            sparse.values_byte_offset,
            sparse.count,
            elem_size,
            elem_size,
            value_bytes.len(),
        )?;

        for i in 0..sparse.count {
            let index =
                index_type.read(&index_bytes[sparse.indices_byte_offset + i * index_type.size()..])
                    as usize;
            if index >= count {
                return Err(ImportError::format(format!(
                    "sparse index {} is outside the accessor's {} elements",
                    index, count
                )));
            }
            let src = sparse.values_byte_offset + i * elem_size;
            let dst = index * elem_size;
            data[dst..dst + elem_size].copy_from_slice(&value_bytes[src..src + elem_size]);
        }
    }

    Ok(data)
}

/// Decodes an index accessor, widening u8/u16/u32 to `u32`.
pub fn read_indices(document: &Document, accessor_index: usize) -> Result<Vec<u32>> {
    let accessor = lookup(&document.accessors, TableKind::Accessor, accessor_index)?;
    if accessor.element_type != ElementType::Scalar {
        return Err(ImportError::format(format!(
            "index accessor {} must be SCALAR, found {}",
            accessor_index,
            accessor.element_type.tag()
        )));
    }
    let index_type = IndexType::try_from(ComponentType::from_code(accessor.component_type)?)?;

    let data = read_accessor_data(document, accessor)?;
    Ok(data
        .chunks_exact(index_type.size())
        .map(|chunk| index_type.read(chunk))
        .collect())
}

fn component_to_f32(component: ComponentType, normalized: bool, bytes: &[u8]) -> Result<f32> {
    match (component, normalized) {
        (ComponentType::F32, _) => Ok(bytemuck::pod_read_unaligned::<f32>(&bytes[..4])),
        (ComponentType::U8, true) => Ok(bytes[0] as f32 / 255.0),
        (ComponentType::U16, true) => {
            Ok(u16::from_le_bytes([bytes[0], bytes[1]]) as f32 / 65535.0)
        }
        (ComponentType::I8, true) => Ok((bytes[0] as i8 as f32 / 127.0).max(-1.0)),
        (ComponentType::I16, true) => {
            Ok((i16::from_le_bytes([bytes[0], bytes[1]]) as f32 / 32767.0).max(-1.0))
        }
        (other, _) => Err(ImportError::format(format!(
            "component type {} (normalized: {}) cannot be read as float attribute data",
            other.code(),
            normalized
        ))),
    }
}

/// Decodes an attribute accessor with `N` components per element as floats.
pub fn read_f32<const N: usize>(
    document: &Document,
    accessor_index: usize,
) -> Result<Vec<[f32; N]>> {
    let accessor = lookup(&document.accessors, TableKind::Accessor, accessor_index)?;
    let components = match accessor.element_type {
        ElementType::Scalar => 1,
        ElementType::Vec2 => 2,
        ElementType::Vec3 => 3,
        ElementType::Vec4 => 4,
        _ => 0,
    };
    if components != N {
        return Err(ImportError::format(format!(
            "accessor {} is {}, expected {} components",
            accessor_index,
            accessor.element_type.tag(),
            N
        )));
    }
    let component = ComponentType::from_code(accessor.component_type)?;
    // Fail on the type before touching the buffer.
    if component != ComponentType::F32 && !accessor.normalized {
        return Err(ImportError::format(format!(
            "accessor {} holds un-normalized integer data (component type {})",
            accessor_index, accessor.component_type
        )));
    }

    let data = read_accessor_data(document, accessor)?;
    let size = component.size();
    let mut output = Vec::with_capacity(accessor.count);
    for element in data.chunks_exact(size * N) {
        let mut value = [0f32; N];
        for (k, bytes) in element.chunks_exact(size).enumerate() {
            value[k] = component_to_f32(component, accessor.normalized, bytes)?;
        }
        output.push(value);
    }
    Ok(output)
}

/// Decodes a VEC3 or VEC4 color accessor; VEC3 colors get an alpha of 1.
pub fn read_colors(document: &Document, accessor_index: usize) -> Result<Vec<[f32; 4]>> {
    let accessor = lookup(&document.accessors, TableKind::Accessor, accessor_index)?;
    match accessor.element_type {
        ElementType::Vec3 => Ok(read_f32::<3>(document, accessor_index)?
            .into_iter()
            .map(|[r, g, b]| [r, g, b, 1.0])
            .collect()),
        ElementType::Vec4 => read_f32::<4>(document, accessor_index),
        other => Err(ImportError::format(format!(
            "color accessor {} must be VEC3 or VEC4, found {}",
            accessor_index,
            other.tag()
        ))),
    }
}
