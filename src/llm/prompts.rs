// Fixed instructions sent alongside cached statements and chat queries.

use crate::source::SourceKind;

pub const BANK_SCHEMA_DESCRIPTION: &str = r#"
You are an expert at analyzing financial statements. The provided CSV file represents a bank account statement with the following columns, in order:

1. **transactionDate** – The date the transaction was made (DD/MM/YYYY).
2. **description** – A brief description of the transaction (transfer type, fees, reference numbers).
3. **valueDate** – The date the transaction took effect on the balance.
4. **debit** – Money withdrawn from the account.
5. **credit** – Money deposited into the account.
6. **balance** – The account balance after the transaction.

- A positive value in the credit column means an incoming transaction.
- A positive value in the debit column means an outgoing transaction.
- Rows where every column is empty are padding and carry no information. Ignore them.

Analyze this data to identify spending patterns, detect anomalies, and extract meaningful insights.
"#;

pub const MOBILE_MONEY_SCHEMA_DESCRIPTION: &str = r#"
You are an expert at analyzing mobile money statements. The provided CSV file represents mobile money transactions with the following columns, in order:

1. **date** – Transaction date.
2. **transaction** – Type of transaction.
3. **details** – Transaction details.
4. **transaction_id** – Unique identifier for the transaction.
5. **from** – Sender.
6. **to** – Recipient.
7. **amount** – Transaction amount.
8. **fees** – Transaction fees.
9. **taxes** – Any applied taxes.
10. **balance** – Account balance after the transaction.

- Rows where every column is empty are padding and carry no information. Ignore them.

Analyze this data to identify spending patterns, detect anomalies, and extract meaningful insights.
"#;

pub const BANK_QUERY_INSTRUCTION: &str = r#"
You must strictly follow this format when analyzing the bank statement CSV. Do not deviate from the given structure. However, your response should use natural language to clearly communicate insights.

The cached CSV file represents a bank account statement with the columns transactionDate, description, valueDate, debit, credit and balance.

### Important Rules (Strictly Follow)

- Every row follows this structure without exception.
- Dates are written DD/MM/YYYY.
- The debit column holds outgoing transactions; the credit column holds incoming transactions.
- The balance column shows the updated total after the transaction.
- The description column contains details such as transfer types, fees, or reference numbers.
- The first transaction is at the bottom of the statement, whatever its year.
- Rows where every column is empty are padding. Never count or mention them.
- **All amounts are in UGX** (Ugandan Shillings). Always state the currency.

### How to Respond

- Do not simply extract content; explain it in plain words.
- Example: "On 12/03/2024, a deposit of 500,000 UGX was credited, bringing the balance to 3,200,000 UGX. The description indicates a salary deposit."

Now, answer the following query while maintaining the required structure:
"#;

pub const MOBILE_MONEY_QUERY_INSTRUCTION: &str = r#"
You must strictly follow this format when analyzing the mobile money statement CSV. Do not deviate from the given structure. However, your response should use natural language to clearly communicate insights.

The cached CSV file represents mobile money transactions with the columns date, transaction, details, transaction_id, from, to, amount, fees, taxes and balance.

### Important Rules (Strictly Follow)

- Every row follows this structure without exception.
- Money sent by the account holder appears with the holder in the from column; money received appears with the holder in the to column.
- fees and taxes are charged on top of amount.
- The balance column shows the updated total after the transaction.
- Rows where every column is empty are padding. Never count or mention them.
- **All amounts are in UGX** (Ugandan Shillings). Always state the currency.

### How to Respond

- Do not simply extract content; explain it in plain words.
- Example: "On 03/05/2024 you sent 20,000 UGX to John, paying 500 UGX in fees and 100 UGX in taxes."

Now, answer the following query while maintaining the required structure:
"#;

pub fn schema_description(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::BankStatement => BANK_SCHEMA_DESCRIPTION.trim(),
        SourceKind::MobileMoney => MOBILE_MONEY_SCHEMA_DESCRIPTION.trim(),
    }
}

pub fn query_instruction(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::BankStatement => BANK_QUERY_INSTRUCTION.trim(),
        SourceKind::MobileMoney => MOBILE_MONEY_QUERY_INSTRUCTION.trim(),
    }
}

pub fn budget_recommendation_prompt(income_json: &str, expenses_json: &str) -> String {
    format!(
        r#"Analyze the following budget data:

Income: {income_json}
Expenses: {expenses_json}

The expenses represent the user's planned spending.

Provide specific, actionable recommendations for budget improvement, focusing primarily on expense adjustments.

1. **Overall Assessment:** Briefly summarize strengths and weaknesses, considering the user's fixed income.
2. **Recommendations (Expense Focused):**
   * Prioritize recommendations that adjust expenses.
   * For each recommendation, provide:
     * The category of the expense.
     * The recommended action: "reduce" or "remove".
     * The amount to adjust by (e.g., 500000, "10%").
     * A clear and concise explanation for the recommendation.
   * Avoid recommendations to "increase" or "decrease" income or savings, as these are often less flexible.

**Example Recommendation:**

"Reduce the 'Clothes' expense by 500000. This category appears to be excessive and reducing it will free up funds for other needs."

The main purpose of the recommendations is to make the budget better and achievable.
Provide multiple recommendations, if applicable, using the format above."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BANK_STATEMENT_FIELDS, MOBILE_MONEY_FIELDS};

    #[test]
    fn test_descriptions_name_every_column() {
        for field in BANK_STATEMENT_FIELDS {
            assert!(schema_description(SourceKind::BankStatement).contains(field.name));
            assert!(query_instruction(SourceKind::BankStatement).contains(field.name));
        }
        for field in MOBILE_MONEY_FIELDS {
            assert!(schema_description(SourceKind::MobileMoney).contains(field.name));
            assert!(query_instruction(SourceKind::MobileMoney).contains(field.name));
        }
    }

    #[test]
    fn test_budget_prompt_embeds_data() {
        let prompt = budget_recommendation_prompt(r#"[{"Salary":1}]"#, r#"[{"Rent":2}]"#);
        assert!(prompt.contains(r#"Income: [{"Salary":1}]"#));
        assert!(prompt.contains(r#"Expenses: [{"Rent":2}]"#));
    }
}
