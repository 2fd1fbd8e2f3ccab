//! Bridge between binary class files and [`ClassMetadata`].
//!
//! Parsing keeps the full [`ClassFile`] around so a patched class can be
//! written back with everything except the access flags untouched: constant
//! pool order, attributes and code are re-emitted as read.

use crate::error::{Result, WeaveError};
use ristretto_classfile::{ClassAccessFlags, ClassFile, FieldAccessFlags, MethodAccessFlags};
use saber_core::class::{FieldMetadata, MethodMetadata};
use saber_core::{AccessFlags, ClassMetadata, FieldDescriptor, MethodDescriptor, PatchedClass};
use std::io::Cursor;

pub fn parse_class(path: &str, bytes: &[u8]) -> Result<ClassFile> {
    ClassFile::from_bytes(&mut Cursor::new(bytes.to_vec()))
        .map_err(|e| WeaveError::class_format(path, e))
}

pub fn read_metadata(path: &str, class: &ClassFile) -> Result<ClassMetadata> {
    let pool = &class.constant_pool;
    let name = pool
        .try_get_class(class.this_class)
        .map_err(|e| WeaveError::class_format(path, e))?
        .to_string();

    let super_name = if class.super_class == 0 {
        None
    } else {
        Some(
            pool.try_get_class(class.super_class)
                .map_err(|e| WeaveError::class_format(path, e))?
                .to_string(),
        )
    };

    let interfaces = class
        .interfaces
        .iter()
        .map(|index| {
            pool.try_get_class(*index)
                .map(|name| name.to_string())
                .map_err(|e| WeaveError::class_format(path, e))
        })
        .collect::<Result<Vec<_>>>()?;

    let fields = class
        .fields
        .iter()
        .map(|field| {
            Ok(FieldMetadata {
                field: FieldDescriptor::new(
                    utf8(path, pool, field.name_index)?,
                    utf8(path, pool, field.descriptor_index)?,
                ),
                access: AccessFlags::from_bits_retain(field.access_flags.bits()),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let methods = class
        .methods
        .iter()
        .map(|method| {
            Ok(MethodMetadata {
                method: MethodDescriptor::new(
                    utf8(path, pool, method.name_index)?,
                    utf8(path, pool, method.descriptor_index)?,
                ),
                access: AccessFlags::from_bits_retain(method.access_flags.bits()),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ClassMetadata {
        name,
        super_name,
        interfaces,
        access: AccessFlags::from_bits_retain(class.access_flags.bits()),
        fields,
        methods,
    })
}

/// Parses `bytes` straight to metadata, for classpath entries that are never
/// rewritten.
pub fn metadata_from_bytes(path: &str, bytes: &[u8]) -> Result<ClassMetadata> {
    let class = parse_class(path, bytes)?;
    read_metadata(path, &class)
}

/// Copies the access flags of `patched` onto the members of `class` with the
/// same name and descriptor.
pub fn apply_patch(path: &str, class: &mut ClassFile, patched: &PatchedClass) -> Result<()> {
    class.access_flags = ClassAccessFlags::from_bits_truncate(patched.class.access.bits());

    for field in class.fields.iter_mut() {
        let descriptor = FieldDescriptor::new(
            utf8(path, &class.constant_pool, field.name_index)?,
            utf8(path, &class.constant_pool, field.descriptor_index)?,
        );
        if let Some(target) = patched.class.find_field(&descriptor) {
            field.access_flags = FieldAccessFlags::from_bits_truncate(target.access.bits());
        }
    }

    for method in class.methods.iter_mut() {
        let descriptor = MethodDescriptor::new(
            utf8(path, &class.constant_pool, method.name_index)?,
            utf8(path, &class.constant_pool, method.descriptor_index)?,
        );
        if let Some(target) = patched.class.find_method(&descriptor) {
            method.access_flags = MethodAccessFlags::from_bits_truncate(target.access.bits());
        }
    }

    Ok(())
}

pub fn write_class(class: &ClassFile, name: &str) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    class
        .to_bytes(&mut bytes)
        .map_err(|e| WeaveError::ClassWrite {
            class: name.to_string(),
            message: format!("{e:?}"),
        })?;
    Ok(bytes)
}

fn utf8(path: &str, pool: &ristretto_classfile::ConstantPool, index: u16) -> Result<String> {
    pool.try_get_utf8(index)
        .map(|s| s.to_string())
        .map_err(|e| WeaveError::class_format(path, e))
}
