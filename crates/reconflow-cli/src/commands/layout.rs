//! Layout command

use reconflow_core::PathLayout;
use std::path::Path;

pub fn run(images_dir: &Path) {
    let layout = PathLayout::new(images_dir);

    println!("Output Layout");
    println!("=============\n");

    println!("Directories:");
    for (label, path) in layout.directories() {
        println!("  {:<14} {}", label, path.display());
    }

    println!();
    println!("Artifacts:");
    for (label, path) in layout.artifacts() {
        println!("  {:<18} {}", label, path.display());
    }
}
