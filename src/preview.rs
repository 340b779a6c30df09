use crate::vfs::VirtualFS;
use colored::Colorize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Represents a node in the tree (either file or directory).
#[derive(Debug)]
struct TreeNode {
    name: String,
    children: Vec<Rc<RefCell<TreeNode>>>,
    is_file: bool,
}
impl TreeNode {
    fn new(name: String, is_file: bool) -> Self {
        Self {
            name,
            children: Vec::new(),
            is_file,
        }
    }
}

/// Build the directory tree from the VFS entries, returning the root node.
fn build_tree(vfs: &VirtualFS, destination: &Path) -> Rc<RefCell<TreeNode>> {
    // drop trailing separators so parent lookups line up
    let destination: PathBuf = destination.components().collect();
    let destination = destination.as_path();

    // create a root node to represent the 'destination' directory
    let root_name = destination
        .file_name()
        .map(|os| os.to_string_lossy().to_string())
        .unwrap_or_else(|| destination.display().to_string());

    let root = Rc::new(RefCell::new(TreeNode::new(root_name, false)));

    // map full path to node
    let mut lookup: HashMap<String, Rc<RefCell<TreeNode>>> = HashMap::new();

    let root_str = destination.to_string_lossy().to_string();
    lookup.insert(root_str, Rc::clone(&root));

    for entry in &vfs.entries {
        let full_path = destination.join(&entry.destination);
        let full_str = full_path.to_string_lossy().to_string();

        // directories rendered to the same name merge
        if lookup.contains_key(&full_str) {
            continue;
        }

        let Some(parent_path) = full_path.parent() else {
            continue;
        };
        let parent_str = parent_path.to_string_lossy().to_string();

        let parent_node = match lookup.get(&parent_str) {
            Some(node) => Rc::clone(node),
            None => {
                // a substituted segment containing '/' nests below an unlisted directory
                log::debug!(
                    "parent: {}, not found for path: {}",
                    parent_str,
                    entry.destination.display()
                );
                continue;
            }
        };

        let child_name = full_path
            .file_name()
            .map(|os| os.to_string_lossy().to_string())
            .unwrap_or_else(|| full_str.clone());

        let new_child = Rc::new(RefCell::new(TreeNode::new(child_name, entry.is_file)));

        parent_node
            .borrow_mut()
            .children
            .push(Rc::clone(&new_child));

        lookup.insert(full_str, new_child);
    }

    root
}

/// Draw the tree with a nice ASCII style.
fn draw_tree(node: &Rc<RefCell<TreeNode>>, prefix: &str, is_last: bool, out: &mut String) {
    let node_borrow = node.borrow();

    let connector = if is_last {
        "└── ".yellow()
    } else {
        "├── ".yellow()
    };
    let name = if node_borrow.is_file {
        node_borrow.name.green()
    } else {
        node_borrow.name.blue()
    };
    let _ = writeln!(out, "{}{}{}", prefix.yellow(), connector, name);

    let child_prefix = if is_last {
        format!("{}    ", prefix)
    } else {
        format!("{}│   ", prefix)
    };

    let len = node_borrow.children.len();
    for (i, child) in node_borrow.children.iter().enumerate() {
        let last = i == len - 1;
        draw_tree(child, &child_prefix, last, out);
    }
}

/// Renders the staged output of a render as a tree rooted at `destination`.
pub fn tree_string(vfs: &VirtualFS, destination: &Path) -> String {
    let tree_root = build_tree(vfs, destination);
    let mut out = String::new();

    draw_tree(&tree_root, "", true, &mut out);

    out
}

pub fn preview_as_tree(vfs: &VirtualFS, destination: &Path) {
    println!(
        "Legend: {} = (directory), {} = (file)",
        "blue".blue(),
        "green".green()
    );

    let fancy_prompt = format!(
        "{} {}\n",
        "┌─".bold().bright_blue(),
        "Preview".bold().bright_blue(),
    );

    println!("{}", fancy_prompt);

    print!("{}", tree_string(vfs, destination));

    let fancy_prompt = format!(
        "\n{} {}\n",
        "└─".bold().bright_blue(),
        format!(
            "dry run: {} file(s), {} directories would be written",
            vfs.files().count(),
            vfs.distinct_directories().len()
        )
        .bright_green()
    );

    println!("{}", fancy_prompt);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::VirtualEntry;

    #[test]
    fn test_tree_lists_every_entry_once() {
        let mut vfs = VirtualFS::new();
        vfs.push(VirtualEntry::directory("{{a}}".into(), "src".into()));
        vfs.push(VirtualEntry::directory("{{b}}".into(), "src".into()));
        vfs.push(VirtualEntry::file(
            "{{a}}/main.rs".into(),
            "src/main.rs".into(),
            String::new(),
        ));
        vfs.push(VirtualEntry::file(
            "README.md".into(),
            "README.md".into(),
            String::new(),
        ));

        let tree = tree_string(&vfs, Path::new("/tmp/output"));

        assert!(tree.contains("output"));
        assert_eq!(tree.matches("src").count(), 1);
        assert!(tree.contains("main.rs"));
        assert!(tree.contains("README.md"));
        assert_eq!(tree.lines().count(), 4);
    }
}
