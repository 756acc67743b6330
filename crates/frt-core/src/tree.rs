//! Composite file tree built fresh for every run
//!
//! The tree is a snapshot of a staging (or delete) directory: folders and
//! files, children sorted by name, with rule files and platform metadata
//! files left out. Planning walks it once and discards it.

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::context::OperationContext;
use crate::rules::{MatchRule, RuleResolver};
use crate::{Error, Result};

/// Platform metadata files that never take part in a run
pub const RESERVED_NAMES: [&str; 3] = [".DS_Store", "Thumbs.db", "desktop.ini"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    File,
    Folder,
}

/// A node of the snapshot tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileNode {
    File {
        path: PathBuf,
        relative: String,
    },
    Folder {
        path: PathBuf,
        relative: String,
        children: Vec<FileNode>,
    },
}

/// A directory entry the builder could not read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildProblem {
    pub relative: String,
    pub reason: String,
}

/// A snapshot of one directory tree
#[derive(Debug)]
pub struct FileTree {
    pub root: FileNode,
    pub problems: Vec<BuildProblem>,
}

impl FileTree {
    /// Snapshot the tree under `root`.
    ///
    /// # Errors
    ///
    /// Fails only when `root` itself is not a readable directory. Unreadable
    /// subdirectories become empty folders listed in [`FileTree::problems`].
    pub fn build(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(Error::RootNotFound {
                path: root.to_path_buf(),
            });
        }
        let mut problems = Vec::new();
        let children = read_children(root, "", &mut problems)
            .map_err(|e| frt_fs::Error::io(root, e))?;
        Ok(Self {
            root: FileNode::Folder {
                path: root.to_path_buf(),
                relative: String::new(),
                children,
            },
            problems,
        })
    }
}

/// Whether a directory entry named `name` belongs in the tree.
pub fn is_tracked(name: &str) -> bool {
    !RuleResolver::is_rule_file(name) && !RESERVED_NAMES.contains(&name)
}

fn read_children(
    dir: &Path,
    relative: &str,
    problems: &mut Vec<BuildProblem>,
) -> std::io::Result<Vec<FileNode>> {
    let mut entries: Vec<(String, PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir)?.filter_map(|entry| entry.ok()) {
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            let lossy = file_name.to_string_lossy();
            tracing::warn!(dir = %dir.display(), name = %lossy, "skipping entry with non-UTF-8 name");
            problems.push(BuildProblem {
                relative: join_relative(relative, &lossy),
                reason: "file name is not valid UTF-8".to_string(),
            });
            continue;
        };
        if is_tracked(name) {
            entries.push((name.to_string(), entry.path()));
        }
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut children = Vec::with_capacity(entries.len());
    for (name, path) in entries {
        let child_relative = join_relative(relative, &name);
        if path.is_dir() {
            let grandchildren = match read_children(&path, &child_relative, problems) {
                Ok(nodes) => nodes,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "unreadable directory");
                    problems.push(BuildProblem {
                        relative: child_relative.clone(),
                        reason: e.to_string(),
                    });
                    Vec::new()
                }
            };
            children.push(FileNode::Folder {
                path,
                relative: child_relative,
                children: grandchildren,
            });
        } else if path.is_file() {
            children.push(FileNode::File {
                path,
                relative: child_relative,
            });
        }
    }
    Ok(children)
}

fn join_relative(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

impl FileNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            FileNode::File { .. } => NodeKind::File,
            FileNode::Folder { .. } => NodeKind::Folder,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            FileNode::File { path, .. } | FileNode::Folder { path, .. } => path,
        }
    }

    /// Slash-separated path relative to the tree root; empty for the root.
    pub fn relative(&self) -> &str {
        match self {
            FileNode::File { relative, .. } | FileNode::Folder { relative, .. } => relative,
        }
    }

    pub fn name(&self) -> &str {
        self.relative().rsplit('/').next().unwrap_or_default()
    }

    pub fn children(&self) -> &[FileNode] {
        match self {
            FileNode::File { .. } => &[],
            FileNode::Folder { children, .. } => children,
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(FileNode::node_count).sum::<usize>()
    }

    /// Plan this subtree.
    ///
    /// `rule` is the rule governing this node: for a file, its folder's
    /// effective rule; for a folder, the rule carried by its parent.
    pub fn process(
        &self,
        resolver: &RuleResolver,
        rule: Option<&Rc<MatchRule>>,
        ctx: &mut OperationContext<'_>,
    ) {
        ctx.visit(self.relative(), self.kind());
        match self {
            FileNode::File { .. } => {
                if let Some(rule) = rule {
                    rule.strategy_type.strategy().plan_file(self, rule, ctx);
                }
            }
            FileNode::Folder { path, children, .. } => {
                let resolution = resolver.resolve(path, rule);
                if let Some(problem) = &resolution.problem {
                    ctx.skip(self.relative(), problem.to_string());
                }
                let effective = resolution.effective();
                if let Some(rule) = effective {
                    rule.strategy_type.strategy().plan_folder(self, rule, ctx);
                }

                for file in children.iter().filter(|c| c.kind() == NodeKind::File) {
                    file.process(resolver, effective, ctx);
                }
                let carried = resolution.for_children();
                for folder in children.iter().filter(|c| c.kind() == NodeKind::Folder) {
                    folder.process(resolver, carried.as_ref(), ctx);
                }
            }
        }
    }
}
