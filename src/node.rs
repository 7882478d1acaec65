use serde::Serialize;

/// MIME type Drive reports for folders.
pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

/// File node vs folder node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    File,
    Folder,
}

impl NodeKind {
    pub fn from_mime(mime: &str) -> Self {
        if mime == FOLDER_MIME {
            Self::Folder
        } else {
            Self::File
        }
    }

    pub fn is_folder(&self) -> bool {
        *self == Self::Folder
    }
}

/// A folder or file discovered during a crawl. Children are owned by their parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriveNode {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    pub children: Vec<DriveNode>,
}

/// One pre-order row of a flattened tree. Folders carry no id, files do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRow {
    pub id: Option<String>,
    pub name: String,
}

impl FlatRow {
    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    pub fn file(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: name.into(),
        }
    }
}

impl DriveNode {
    pub fn folder(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: NodeKind::Folder,
            children: Vec::new(),
        }
    }

    pub fn file(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: NodeKind::File,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Self>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn is_folder(&self) -> bool {
        self.kind.is_folder()
    }

    /// Pre-order iterator over this node and all of its descendants.
    pub fn iter(&self) -> NodeIter<'_> {
        NodeIter { stack: vec![self] }
    }

    /// Flattens the descendants (not this node) into pre-order rows with sanitized names.
    pub fn flatten(&self) -> Vec<FlatRow> {
        let mut rows = Vec::new();
        self.flatten_into(&mut rows);
        rows
    }

    fn flatten_into(&self, rows: &mut Vec<FlatRow>) {
        for child in &self.children {
            let name = sanitize_name(&child.name);
            if child.is_folder() {
                rows.push(FlatRow::folder(name));
                child.flatten_into(rows);
            } else if child.children.is_empty() {
                rows.push(FlatRow::file(child.id.clone(), name));
            }
        }
    }
}

pub struct NodeIter<'a> {
    stack: Vec<&'a DriveNode>,
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = &'a DriveNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Replaces path separators so a remote name is always a single path segment.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c == '/' || std::path::is_separator(c) {
                '_'
            } else {
                c
            }
        })
        .collect()
}
