//! Agent5: payslips, anomalies and a payroll summary.

use serde::{Deserialize, Serialize};

use super::dataset::{pretty, HrDataset};
use super::prompts::PAYROLL_PROMPT;
use super::recovery::{number_or_string, ExpectedShape};
use super::Briefing;
use crate::llm_client::prompts::with_json_only;

pub struct Payroll;

/// One payslip. Field names follow the snake-with-capitals keys the
/// prompt asks for (`Base_Salary`, `Net_Pay`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payslip {
    #[serde(rename = "Employee")]
    pub employee: String,
    #[serde(rename = "Department", default)]
    pub department: String,
    #[serde(rename = "Base_Salary", deserialize_with = "number_or_string")]
    pub base_salary: f64,
    #[serde(rename = "Tax_Deduction", deserialize_with = "number_or_string")]
    pub tax_deduction: f64,
    #[serde(rename = "Bonus", deserialize_with = "number_or_string")]
    pub bonus: f64,
    #[serde(rename = "Net_Pay", deserialize_with = "number_or_string")]
    pub net_pay: f64,
    #[serde(rename = "Remarks", default)]
    pub remarks: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollSummary {
    #[serde(rename = "Total_Payroll_Cost", deserialize_with = "number_or_string")]
    pub total_payroll_cost: f64,
    #[serde(rename = "Average_Salary", deserialize_with = "number_or_string")]
    pub average_salary: f64,
    #[serde(rename = "Anomalies", default)]
    pub anomalies: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollReport {
    #[serde(rename = "Payroll_Analysis")]
    pub analysis: String,
    #[serde(rename = "Payslips")]
    pub payslips: Vec<Payslip>,
    #[serde(rename = "Summary")]
    pub summary: PayrollSummary,
}

impl ExpectedShape for PayrollReport {
    fn validate(&self) -> Result<(), String> {
        for slip in &self.payslips {
            let amounts = [slip.base_salary, slip.tax_deduction, slip.bonus, slip.net_pay];
            if amounts.iter().any(|a| !a.is_finite() || *a < 0.0) {
                return Err(format!("payslip for {} has a negative amount", slip.employee));
            }
        }
        Ok(())
    }

    fn describe(&self) -> Option<String> {
        Some(format!(
            "{} payslips, total payroll cost {:.2}, {} anomalies",
            self.payslips.len(),
            self.summary.total_payroll_cost,
            self.summary.anomalies.len()
        ))
    }
}

impl Briefing for Payroll {
    const ID: &'static str = "Agent5";
    type Output = PayrollReport;

    fn render_prompt(dataset: &HrDataset) -> String {
        with_json_only(
            PAYROLL_PROMPT
                .replace("{employees}", &pretty(&dataset.list("employees")))
                .replace("{performance}", &pretty(&dataset.object("performance_reports"))),
        )
    }
}
