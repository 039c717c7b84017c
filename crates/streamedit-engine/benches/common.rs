// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_source(functions: usize) -> String {
    (0..functions)
        .map(|i| format!("fn item_{i}(x: u32) -> u32 {{\n    let y = x + {i};\n    y * 2\n}}\n\n"))
        .collect()
}

/// A diff stream rewriting the body of every `step`-th function
#[allow(dead_code)]
pub fn generate_diff(functions: usize, step: usize) -> String {
    (0..functions)
        .step_by(step)
        .map(|i| {
            format!(
                "SEARCH\n    let y = x + {i};\n    y * 2\n=======\nREPLACE\n    (x + {i}) * 2"
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Cut `text` into fixed-size pieces on char boundaries
#[allow(dead_code)]
pub fn chunk(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(size).map(|c| c.iter().collect()).collect()
}
