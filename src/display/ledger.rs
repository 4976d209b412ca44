//! Expense and adjustment display formatting

use crate::models::{Adjustment, Expense};

pub fn format_expense_list(expenses: &[Expense]) -> String {
    if expenses.is_empty() {
        return "No expenses found.".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!("{:<10}  {:>12}  {}\n", "Date", "Amount", "Description"));
    output.push_str(&format!("{:-<10}  {:->12}  {:-<20}\n", "", "", ""));
    for expense in expenses {
        output.push_str(&format!(
            "{:<10}  {:>12}  {}\n",
            expense.date.to_string(),
            expense.amount.to_string(),
            expense.description
        ));
    }

    let total: crate::models::Money = expenses.iter().map(|e| e.amount).sum();
    output.push_str(&format!("{:-<10}  {:->12}\n", "", ""));
    output.push_str(&format!("{:<10}  {:>12}\n", "TOTAL", total.to_string()));
    output
}

pub fn format_adjustment_list(adjustments: &[Adjustment]) -> String {
    if adjustments.is_empty() {
        return "No adjustments found.".to_string();
    }

    let kind_width = adjustments
        .iter()
        .map(|a| a.kind.to_string().len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<10}  {:<10}  {:>12}  {:<kind_width$}  {}\n",
        "From",
        "To",
        "Per Day",
        "Kind",
        "Note",
        kind_width = kind_width,
    ));
    output.push_str(&format!(
        "{:-<10}  {:-<10}  {:->12}  {:-<kind_width$}  {:-<10}\n",
        "",
        "",
        "",
        "",
        "",
        kind_width = kind_width,
    ));
    for adjustment in adjustments {
        output.push_str(&format!(
            "{:<10}  {:<10}  {:>12}  {:<kind_width$}  {}\n",
            adjustment.first_day_effective.to_string(),
            adjustment.last_day_effective.to_string(),
            adjustment.amount_per_day.to_string(),
            adjustment.kind.to_string(),
            adjustment.short_description.as_deref().unwrap_or(""),
            kind_width = kind_width,
        ));
    }
    output
}
