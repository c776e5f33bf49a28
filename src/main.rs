use std::fs::read_to_string;

use hubassign::{Problem, report};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .expect("Usage: <program> <input_file.yaml>");

    let buf = read_to_string(path)?;
    let problem: Problem = serde_yaml::from_str(&buf)?;
    let assignment = problem.solve()?;

    print!("{}", report::render(&assignment));
    Ok(())
}
