//! Functions command implementation

use std::process::ExitCode;

use crate::generator::Generator;

use super::EXIT_SUCCESS;

/// Execute the functions command
pub fn run_functions() -> ExitCode {
    let generator = Generator::new();

    println!("Custom functions:");
    print_names(&generator.functions().custom_names());
    println!();
    println!("Math functions:");
    print_names(&generator.functions().math_names());
    println!();
    println!("Selector functions:");
    print_names(&generator.selectors().names());

    ExitCode::from(EXIT_SUCCESS)
}

fn print_names(names: &[&str]) {
    for name in names {
        println!("  @{}", name);
    }
}
