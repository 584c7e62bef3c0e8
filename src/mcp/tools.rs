//! The MCP tools. Each one runs the command of the same name.

use crate::args::{
    DeleteIdsArgs, InsertPaymentArgs, InsertWorkLogArgs, SummaryArgs, TotalsArgs,
    UpdatePaymentArgs, UpdateWorkLogArgs,
};
use crate::commands;
use crate::mcp::mcp_utils::tool_result;
use crate::mcp::ArzServer;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use rmcp::ErrorData as McpError;
use rmcp::{tool, tool_router};
use tracing::info;

#[tool_router(vis = "pub(super)")]
impl ArzServer {
    #[tool]
    /// Initialize the arz MCP service for this session and return usage instructions. You
    /// **MUST** call this **ONCE** before using other tools so that you have the full usage
    /// instructions. You **MAY** call it more than once if you have forgotten the usage
    /// instructions.
    async fn initialize_service(&self) -> Result<CallToolResult, McpError> {
        let mut initialized = self.initialized.lock().await;
        *initialized = true;
        Ok(CallToolResult::success(vec![rmcp::model::Content::text(
            include_str!("docs/INSTRUCTIONS.md"),
        )]))
    }

    /// Download the shared Clockify time report and replace every imported work log with its
    /// entries.
    ///
    /// Imported work logs are always valued at the configured `fixed_rate`, whatever rate the
    /// report shows. Manually entered work logs and payments are not touched. If the report cannot
    /// be fetched an error is returned and the previously imported work logs are kept.
    #[tool]
    async fn sync(&self) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: sync called");
        tool_result(commands::sync(self.config(), self.mode).await)
    }

    /// Add a manually entered work log: a description, the hours worked and optionally an hourly
    /// rate in the earnings currency, a start and an end.
    ///
    /// `hours` and `rate` must be positive. When `rate` is left out the configured `fixed_rate` is
    /// used. Numbers may be sent as JSON numbers or as strings such as `"1,250.50"`. Timestamps
    /// may be RFC 3339 or `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM` (UTC).
    ///
    /// # Returns
    ///
    /// The saved work log, including its generated `user-` id.
    #[tool]
    async fn insert_work_log(
        &self,
        Parameters(args): Parameters<InsertWorkLogArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        tool_result(commands::insert_work_log(self.config(), args).await)
    }

    /// Add a payment received in the local currency.
    ///
    /// `exchange_rate` is the number of local currency units that one unit of the earnings
    /// currency was worth **on the day of the payment**. It is stored with the payment and used
    /// for every future balance, so ask the user for the historical rate rather than today's.
    /// `date` defaults to now.
    ///
    /// # Example
    ///
    /// ```json
    /// {
    ///   "amount": "400,000",
    ///   "exchange_rate": "50,000",
    ///   "date": "2025-05-01",
    ///   "description": "May invoice"
    /// }
    /// ```
    #[tool]
    async fn insert_payment(
        &self,
        Parameters(args): Parameters<InsertPaymentArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        tool_result(commands::insert_payment(self.config(), args).await)
    }

    /// Change fields of a manually entered work log. Only the fields that are given are changed.
    /// Imported work logs (ids starting with `clockify-`) cannot be changed.
    #[tool]
    async fn update_work_log(
        &self,
        Parameters(args): Parameters<UpdateWorkLogArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        tool_result(commands::update_work_log(self.config(), args).await)
    }

    /// Change fields of a payment. Only the fields that are given are changed.
    #[tool]
    async fn update_payment(
        &self,
        Parameters(args): Parameters<UpdatePaymentArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        tool_result(commands::update_payment(self.config(), args).await)
    }

    /// Delete manually entered work logs by id. Deletion stops at the first id that fails.
    #[tool]
    async fn delete_work_logs(
        &self,
        Parameters(args): Parameters<DeleteIdsArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        tool_result(commands::delete_work_logs(self.config(), args).await)
    }

    /// Delete payments by id. Deletion stops at the first id that fails.
    #[tool]
    async fn delete_payments(
        &self,
        Parameters(args): Parameters<DeleteIdsArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        tool_result(commands::delete_payments(self.config(), args).await)
    }

    /// List the imported work logs, latest first, followed by the manual work logs, newest first.
    #[tool]
    async fn list_work_logs(&self) -> Result<CallToolResult, McpError> {
        require_init!(self);
        tool_result(commands::list_work_logs(self.config()).await)
    }

    /// List the payments, newest first.
    #[tool]
    async fn list_payments(&self) -> Result<CallToolResult, McpError> {
        require_init!(self);
        tool_result(commands::list_payments(self.config()).await)
    }

    /// Compute total hours, total earnings, total payments in both currencies and the outstanding
    /// balance.
    ///
    /// Each payment is converted at its own stored exchange rate. `exchange_rate` is today's rate
    /// and is only used to restate the balance in local currency; leave it out to skip that. Set
    /// `sync` to refresh imported work logs first.
    #[tool]
    async fn totals(
        &self,
        Parameters(args): Parameters<TotalsArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        info!("MCP: totals called");
        tool_result(commands::totals(self.config(), self.mode, args).await)
    }

    /// Compute the totals and return them with a short narrative summary. If the summary cannot
    /// be generated a fixed apology is returned in its place.
    #[tool]
    async fn summary(
        &self,
        Parameters(args): Parameters<SummaryArgs>,
    ) -> Result<CallToolResult, McpError> {
        require_init!(self);
        tool_result(commands::summary(self.config(), self.mode, args).await)
    }
}
