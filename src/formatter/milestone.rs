use crate::app::RunReport;
use crate::formatter::{MarkdownContent, format_due_on};
use crate::types::Milestone;

pub fn milestone_line_markdown(milestone: &Milestone) -> String {
    let mut line = format!(
        "- {} (Milestone number: {}, due: {})",
        milestone.title,
        milestone.number,
        format_due_on(milestone.due_on)
    );
    if let Some(url) = &milestone.html_url {
        line.push_str(&format!(" {}", url));
    }
    line
}

pub fn run_report_markdown(report: &RunReport) -> MarkdownContent {
    let mut content = String::new();

    content.push_str(&format!("# {}\n", report.repository));

    if let Some(open_milestones) = &report.open_milestones {
        content.push_str("\n## Open Milestones\n");
        if open_milestones.is_empty() {
            content.push_str("None\n");
        }
        for milestone in open_milestones {
            content.push_str(&format!("{}\n", milestone_line_markdown(milestone)));
        }
    }

    if let Some(summary) = &report.close_summary {
        content.push_str("\n## Closed Overdue Milestones\n");
        if summary.closed.is_empty() {
            content.push_str("None\n");
        }
        for milestone in &summary.closed {
            content.push_str(&format!("{}\n", milestone_line_markdown(milestone)));
        }

        if !summary.failures.is_empty() {
            content.push_str("\n## Failed To Close\n");
            for failure in &summary.failures {
                content.push_str(&format!(
                    "{}\n  - Error: {}\n",
                    milestone_line_markdown(&failure.milestone),
                    failure.error
                ));
            }
        }
    }

    if let Some(created) = &report.created {
        content.push_str("\n## Created Milestone\n");
        content.push_str(&format!("{}\n", milestone_line_markdown(created)));
    }

    if let Some(error) = &report.create_error {
        content.push_str("\n## Failed To Create Milestone\n");
        content.push_str(&format!("{}\n", error));
    }

    MarkdownContent(content)
}
