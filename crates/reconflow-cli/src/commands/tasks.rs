//! Tasks command

use reconflow_core::TaskSelector;

pub fn run() {
    println!("Tasks");
    println!("=====\n");

    for task in TaskSelector::ALL {
        println!("  {}  {:<17} {}", task.number(), task.name(), task.description());
    }

    println!();
    println!("Tasks 1-4 expect the outputs of the previous task to exist.");
}
