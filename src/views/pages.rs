use std::fmt::Write;

use crate::models::{Category, Role};

use super::header;

pub fn landing() -> String {
    let mut output = String::new();
    header(
        &mut output,
        "Student Feedback Portal",
        "Honest, structured feedback that helps teaching improve.",
    );

    let _ = writeln!(output, "## How it works");
    let _ = writeln!(output, "- Students rate each of their teachers once, anonymously to peers.");
    let _ = writeln!(output, "- Teachers follow their averages and monthly trends.");
    let _ = writeln!(output, "- Administrators register users and review department performance.");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Rated categories");
    for category in Category::ALL {
        let _ = writeln!(output, "- {}", category.label());
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "Sign in at /login to get started.");
    output
}

pub fn login() -> String {
    let mut output = String::new();
    header(&mut output, "Sign In", "Use your enrollment number and password.");
    let _ = writeln!(output, "login <enrollment-number> <password>");
    output
}

pub fn register() -> String {
    let mut output = String::new();
    header(&mut output, "Register New User", "Create a student, teacher, or admin account.");

    let roles: Vec<&str> = Role::ALL.iter().map(|r| r.as_str()).collect();
    let _ = writeln!(output, "Fields:");
    let _ = writeln!(output, "- full name (at least 2 characters)");
    let _ = writeln!(output, "- enrollment number (at least 3 characters)");
    let _ = writeln!(output, "- password (at least 6 characters)");
    let _ = writeln!(output, "- role: {}", roles.join(" | "));
    let _ = writeln!(output, "- subject name and subject code (teachers only)");
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "register <name> <enrollment-number> <password> <role> [subject-name] [subject-code]"
    );
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_page_lists_every_role() {
        let page = register();
        assert!(page.contains("Student | Teacher | Admin"));
    }

    #[test]
    fn landing_lists_categories() {
        let page = landing();
        assert!(page.contains("Class Preparation"));
        assert!(page.contains("/login"));
    }
}
