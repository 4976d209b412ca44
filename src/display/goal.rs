//! Goal display formatting
//!
//! Formats goals for terminal output in table and detail views.

use crate::models::{Goal, Money};

/// A goal with its balance as of the day being displayed
#[derive(Debug, Clone)]
pub struct GoalSummary {
    pub goal: Goal,
    pub balance: Money,
    /// Nesting depth in the goal tree, 0 for top-level goals
    pub depth: usize,
}

/// Format goals as an indented table
pub fn format_goal_list(summaries: &[GoalSummary]) -> String {
    if summaries.is_empty() {
        return "No goals found.".to_string();
    }

    let label = |s: &GoalSummary| format!("{}{}", "  ".repeat(s.depth), s.goal.name);
    let name_width = summaries.iter().map(|s| label(s).len()).max().unwrap_or(4).max(4);
    let period_width = summaries
        .iter()
        .map(|s| s.goal.period.to_string().len())
        .max()
        .unwrap_or(6)
        .max(6);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:>12}  {:<period_width$}  {:>12}  {}\n",
        "Name",
        "Amount",
        "Period",
        "Balance",
        "Status",
        name_width = name_width,
        period_width = period_width,
    ));
    output.push_str(&format!(
        "{:-<name_width$}  {:->12}  {:-<period_width$}  {:->12}  {:-<10}\n",
        "",
        "",
        "",
        "",
        "",
        name_width = name_width,
        period_width = period_width,
    ));

    for summary in summaries {
        let goal = &summary.goal;
        let status = if goal.archived {
            "Archived"
        } else if goal.carry_over_balance {
            "Carry-over"
        } else {
            ""
        };
        output.push_str(&format!(
            "{:<name_width$}  {:>12}  {:<period_width$}  {:>12}  {}\n",
            label(summary),
            goal.amount.to_string(),
            goal.period.to_string(),
            summary.balance.to_string(),
            status,
            name_width = name_width,
            period_width = period_width,
        ));
    }

    output
}

/// Format a single goal's details
pub fn format_goal_details(summary: &GoalSummary, parent: Option<&Goal>, children: &[Goal]) -> String {
    let goal = &summary.goal;
    let yes_no = |flag: bool| if flag { "Yes" } else { "No" };

    let mut output = String::new();
    output.push_str(&format!("Goal: {}\n", goal.name));
    output.push_str(&format!("  ID:             {}\n", goal.id));
    output.push_str(&format!("  Amount:         {}\n", goal.amount));
    output.push_str(&format!("  Period:         {}\n", goal.period));
    output.push_str(&format!("  Pay Frequency:  {}\n", goal.pay_frequency));
    output.push_str(&format!("  Start:          {}\n", goal.start));
    if let Some(end) = goal.end {
        output.push_str(&format!("  End:            {}\n", end));
    }
    output.push_str(&format!("  Carry-over:     {}\n", yes_no(goal.carry_over_balance)));
    output.push_str(&format!("  Archived:       {}\n", yes_no(goal.archived)));
    if let Some(parent) = parent {
        output.push_str(&format!("  Parent:         {}\n", parent.name));
    }
    if !children.is_empty() {
        let names: Vec<_> = children.iter().map(|c| c.name.as_str()).collect();
        output.push_str(&format!("  Children:       {}\n", names.join(", ")));
    }
    output.push('\n');
    output.push_str(&format!("  Balance:        {}\n", summary.balance));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CalendarDay;

    #[test]
    fn test_list_indents_children() {
        let start = CalendarDay::from_ymd(2025, 1, 1).unwrap();
        let parent = Goal::monthly("Home", Money::from_cents(50000), start);
        let child = Goal::monthly("Food", Money::from_cents(20000), start).with_parent(parent.id);
        let summaries = vec![
            GoalSummary {
                goal: parent,
                balance: Money::from_cents(1000),
                depth: 0,
            },
            GoalSummary {
                goal: child,
                balance: Money::from_cents(-250),
                depth: 1,
            },
        ];

        let output = format_goal_list(&summaries);
        assert!(output.contains("\n  Food"));
        assert!(output.contains("-$2.50"));
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(format_goal_list(&[]), "No goals found.");
    }
}
