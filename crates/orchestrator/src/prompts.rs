use deploy_core::{Attachment, Job};
use tracing::warn;

pub const SYSTEM_PROMPT: &str = "You are an expert front-end developer. You write complete, \
self-contained single-page web applications in one HTML file with inline CSS and JavaScript.";

pub struct ArtifactPrompts;

impl ArtifactPrompts {
    pub fn creation(brief: &str, checks: &[String], attachments: &[Attachment]) -> String {
        format!(
            r#"Create a single, complete HTML file for this task: {brief}

It must pass these checks:
{checks}{attachments}

Output ONLY the raw HTML code."#,
            brief = brief.trim(),
            checks = Self::checks_list(checks),
            attachments = Self::attachment_context(attachments),
        )
    }

    pub fn revision(
        existing_code: &str,
        brief: &str,
        checks: &[String],
        attachments: &[Attachment],
    ) -> String {
        format!(
            r#"Update this existing HTML code:
```html
{existing_code}
```

New task brief: {brief}

New checks:
{checks}{attachments}

Output ONLY the updated, raw HTML code."#,
            existing_code = existing_code.trim(),
            brief = brief.trim(),
            checks = Self::checks_list(checks),
            attachments = Self::attachment_context(attachments),
        )
    }

    fn checks_list(checks: &[String]) -> String {
        if checks.is_empty() {
            return "- (none)".to_string();
        }

        checks
            .iter()
            .map(|check| format!("- {}", check))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Decoded attachments as a context section. Undecodable ones are skipped.
    fn attachment_context(attachments: &[Attachment]) -> String {
        let files: Vec<String> = attachments
            .iter()
            .filter_map(|attachment| match attachment.decode() {
                Ok(content) => Some(format!(
                    "File `{}` content:\n```\n{}\n```",
                    attachment.name, content
                )),
                Err(e) => {
                    warn!("Skipping attachment: {}", e);
                    None
                }
            })
            .collect();

        if files.is_empty() {
            String::new()
        } else {
            format!(
                "\n\nUse the following file(s) as context:\n{}",
                files.join("\n\n")
            )
        }
    }
}

/// Ancillary files committed next to the generated application.
pub struct RepoDocs;

impl RepoDocs {
    pub fn readme(repo_name: &str, job: &Job, pages_url: &str) -> String {
        let checks = if job.checks.is_empty() {
            String::new()
        } else {
            format!(
                "\n## Checks\n\n{}\n",
                job.checks
                    .iter()
                    .map(|check| format!("- {}", check))
                    .collect::<Vec<_>>()
                    .join("\n")
            )
        };

        format!(
            r#"# {title}

**Task Brief (Round {round}):**
{brief}
{checks}
## Live Site

{pages_url}

## License

Released under the MIT License. See [LICENSE](LICENSE).
"#,
            title = Self::title(repo_name),
            round = job.round,
            brief = job.brief.trim(),
            checks = checks,
            pages_url = pages_url,
        )
    }

    pub fn mit_license(year: i32, holder: &str) -> String {
        format!(
            r#"MIT License

Copyright (c) {year} {holder}

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
"#
        )
    }

    /// "tds-calc-v3" -> "Tds Calc V3"
    fn title(repo_name: &str) -> String {
        repo_name
            .split(['-', '_'])
            .filter(|word| !word.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checks() -> Vec<String> {
        vec!["Has digits 0-9".to_string(), "Has equals".to_string()]
    }

    fn job() -> Job {
        serde_json::from_value(serde_json::json!({
            "task": "calc-v3",
            "round": 1,
            "brief": "Build a calculator",
            "checks": ["Has digits 0-9"],
            "email": "e@example.com",
            "nonce": "n",
            "evaluation_url": "https://eval.example.com"
        }))
        .unwrap()
    }

    #[test]
    fn test_creation_prompt_lists_every_check() {
        let prompt = ArtifactPrompts::creation("Build a calculator", &checks(), &[]);

        assert!(prompt.contains("task: Build a calculator"));
        assert!(prompt.contains("- Has digits 0-9\n- Has equals"));
        assert!(!prompt.contains("as context"));
    }

    #[test]
    fn test_creation_prompt_embeds_attachments() {
        let attachments = vec![
            Attachment {
                name: "rates.csv".to_string(),
                url: "data:text/csv;base64,YSxiCjEsMg==".to_string(),
            },
            Attachment {
                name: "broken.bin".to_string(),
                url: "not-a-data-url".to_string(),
            },
        ];

        let prompt = ArtifactPrompts::creation("Show rates", &[], &attachments);

        assert!(prompt.contains("File `rates.csv` content:\n```\na,b\n1,2\n```"));
        assert!(!prompt.contains("broken.bin"));
    }

    #[test]
    fn test_revision_prompt_includes_prior_code() {
        let prompt = ArtifactPrompts::revision("<h1>v1</h1>", "Add a clear button", &checks(), &[]);

        assert!(prompt.starts_with("Update this existing HTML code:"));
        assert!(prompt.contains("<h1>v1</h1>"));
        assert!(prompt.contains("New task brief: Add a clear button"));
        assert!(prompt.contains("- Has equals"));
    }

    #[test]
    fn test_readme_contents() {
        let readme = RepoDocs::readme("tds-calc-v3", &job(), "https://octo.github.io/tds-calc-v3/");

        assert!(readme.starts_with("# Tds Calc V3\n"));
        assert!(readme.contains("**Task Brief (Round 1):**\nBuild a calculator"));
        assert!(readme.contains("- Has digits 0-9"));
        assert!(readme.contains("https://octo.github.io/tds-calc-v3/"));
    }

    #[test]
    fn test_mit_license() {
        let license = RepoDocs::mit_license(2026, "octo");
        assert!(license.starts_with("MIT License"));
        assert!(license.contains("Copyright (c) 2026 octo"));
    }
}
