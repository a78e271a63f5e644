/// Display version information
pub fn execute() {
    println!("quorum-vault {}", env!("CARGO_PKG_VERSION"));
    println!("Multi-signature custodial vault with timelocked proposals");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_execute() {
        // Version command should not panic
        execute();
    }
}
