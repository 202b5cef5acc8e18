/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 the hxfer authors.
 */

use std::sync::{Arc, Mutex};

use super::error::TransferError;

/// Allocations whose lifetime is tied to a transfer resource.
///
/// The engine only ever borrows the option strings, forms and lists handed
/// to it, so their backing memory must stay alive for as long as the native
/// handle may reference them. A duplicated handle references the very same
/// allocations, which is why duplicates share one list by reference; the
/// collections drop, exactly once, when the last owner is closed.
#[derive(Default)]
pub(crate) struct CleanupList {
    strings: Vec<Arc<str>>,
    bytes: Vec<Arc<[u8]>>,
    forms: Vec<Arc<FormData>>,
    lists: Vec<Arc<StringList>>,
}

pub(crate) type SharedCleanup = Arc<Mutex<CleanupList>>;

impl CleanupList {
    pub(crate) fn new_shared() -> SharedCleanup {
        Arc::new(Mutex::new(CleanupList::default()))
    }

    pub(crate) fn track_string(&mut self, s: Arc<str>) {
        self.strings.push(s);
    }

    pub(crate) fn track_bytes(&mut self, b: Arc<[u8]>) {
        self.bytes.push(b);
    }

    pub(crate) fn track_form(&mut self, form: Arc<FormData>) {
        self.forms.push(form);
    }

    pub(crate) fn track_list(&mut self, list: Arc<StringList>) {
        self.lists.push(list);
    }

    #[cfg(test)]
    pub(crate) fn tracked_strings(&self) -> usize {
        self.strings.len()
    }
}

/// One part of a multipart form body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    name: String,
    data: FormPartData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPartData {
    /// Literal content with an explicit length, NUL bytes allowed.
    Bytes(Vec<u8>),
    /// Reference to a file to be uploaded from `path`.
    FilePath(String),
}

impl FormPart {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &FormPartData {
        &self.data
    }
}

/// Multipart form built from ordered post fields.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FormData {
    parts: Vec<FormPart>,
}

impl FormData {
    /// Build a form from name/value pairs in their given order. A value
    /// starting with `@` references the file at the rest of the value; all
    /// other values become literal content parts. A bad entry fails the
    /// whole build so nothing partial is ever installed.
    pub fn from_fields(fields: &[(String, String)]) -> Result<FormData, TransferError> {
        let mut form = FormData::default();
        for (name, value) in fields {
            if let Some(path) = value.strip_prefix('@') {
                if path.is_empty() {
                    return Err(TransferError::FormBuild(format!(
                        "field {name:?} references an empty file path"
                    )));
                }
                form.parts.push(FormPart {
                    name: name.clone(),
                    data: FormPartData::FilePath(path.to_string()),
                });
            } else {
                form.parts.push(FormPart {
                    name: name.clone(),
                    data: FormPartData::Bytes(value.clone().into_bytes()),
                });
            }
        }
        Ok(form)
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }
}

/// Ordered string list for list-shaped options. Entries share their backing
/// allocation with the owning cleanup list.
#[derive(Debug, Default)]
pub struct StringList {
    entries: Vec<Arc<str>>,
}

impl StringList {
    pub(crate) fn append(&mut self, entry: Arc<str>) {
        self.entries.push(entry);
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
