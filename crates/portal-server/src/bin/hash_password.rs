//! Print an argon2 hash for seeding portal users by hand.
//!
//! Usage: `hash-password <password>`

use std::process::ExitCode;

fn main() -> ExitCode {
    let Some(password) = std::env::args().nth(1) else {
        eprintln!("usage: hash-password <password>");
        return ExitCode::FAILURE;
    };
    match portal_server::auth::password::hash_password(&password) {
        Ok(hash) => {
            println!("{hash}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("failed to hash password: {e}");
            ExitCode::FAILURE
        }
    }
}
