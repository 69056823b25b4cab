//! The export registry
//!
//! A fixed, ordered list of table exports. Each entry names the source
//! table, the query projection, the documented output header, and the file
//! the table is written to inside a staging directory.
//!
//! Adding a table means adding one entry here; no other component changes.
//!
//! ## Invariants
//!
//! - The query projection count equals the header label count
//! - Output file names are unique within the registry
//!
//! Both are enforced by [`validate_registry`] and covered by tests.

use thiserror::Error;

/// One entry of the export registry
///
/// Headers are the documented portable labels; they do not have to match the
/// source column names (`sn` exports under `SERIAL_NUMBER`, `created_by_id`
/// under `USER_ID`).
#[derive(Debug, Clone, Copy)]
pub struct TableExport {
    /// Logical table name, used in error reporting
    pub table: &'static str,
    /// Output file name within the staging directory
    pub file_name: &'static str,
    /// Ordered header labels, written as the first record
    pub header: &'static [&'static str],
    /// Query projecting exactly `header.len()` columns
    pub query: &'static str,
}

impl TableExport {
    /// Number of columns this export yields
    pub fn columns(&self) -> usize {
        self.header.len()
    }

    /// Check the header/projection invariant for this entry
    pub fn validate(&self) -> Result<(), RegistryError> {
        let projected = projection_count(self.query);
        if projected != self.header.len() {
            return Err(RegistryError::HeaderMismatch {
                table: self.table,
                header: self.header.len(),
                projection: projected,
            });
        }
        Ok(())
    }
}

/// Registry validation errors
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Query projection width differs from the header label count
    #[error("table '{table}': header has {header} labels but query projects {projection} columns")]
    HeaderMismatch {
        /// Offending table
        table: &'static str,
        /// Header label count
        header: usize,
        /// Query projection count
        projection: usize,
    },

    /// Two entries write to the same output file
    #[error("duplicate output file name: {0}")]
    DuplicateFile(&'static str),
}

/// Count the columns projected by a registry query
///
/// Registry queries are plain `SELECT col, ... FROM` projections without
/// expressions, so splitting the projection on commas is exact.
fn projection_count(query: &str) -> usize {
    let rest = match query.split_once("SELECT") {
        Some((_, rest)) => rest,
        None => return 0,
    };
    let projection = match rest.split_once("FROM") {
        Some((projection, _)) => projection,
        None => rest,
    };
    projection.split(',').filter(|c| !c.trim().is_empty()).count()
}

/// The ordered, immutable export registry
pub fn registry() -> &'static [TableExport] {
    &REGISTRY
}

/// Validate every entry plus the registry-wide unique-file invariant
pub fn validate_registry(entries: &[TableExport]) -> Result<(), RegistryError> {
    for entry in entries {
        entry.validate()?;
    }
    for (i, entry) in entries.iter().enumerate() {
        if entries[..i].iter().any(|e| e.file_name == entry.file_name) {
            return Err(RegistryError::DuplicateFile(entry.file_name));
        }
    }
    Ok(())
}

static REGISTRY: [TableExport; 11] = [
    TableExport {
        table: "notes",
        file_name: "notes.csv",
        header: &["ID", "ORDER_ID", "USER_ID", "CREATED_AT", "NOTE"],
        query: "SELECT id, order_id, created_by_id, created_at, body FROM notes",
    },
    TableExport {
        table: "users",
        file_name: "users.csv",
        header: &["ID", "USERNAME", "FIRST_NAME", "LAST_NAME", "EMAIL"],
        query: "SELECT id, username, first_name, last_name, email \
                FROM users WHERE is_visible = TRUE",
    },
    TableExport {
        table: "orders",
        file_name: "orders.csv",
        header: &[
            "ID",
            "CODE",
            "CREATED_AT",
            "CLOSED_AT",
            "CUSTOMER_ID",
            "USER_ID",
            "QUEUE_ID",
        ],
        query: "SELECT id, code, created_at, closed_at, customer_id, user_id, queue_id \
                FROM orders",
    },
    TableExport {
        table: "queues",
        file_name: "queues.csv",
        header: &["ID", "NAME", "DESCRIPTION"],
        query: "SELECT id, title, description FROM queues",
    },
    TableExport {
        table: "devices",
        file_name: "devices.csv",
        header: &[
            "ID",
            "SERIAL_NUMBER",
            "IMEI",
            "CONFIGURATION",
            "WARRANTY_STATUS",
            "PURCHASE_DATE",
            "NOTES",
        ],
        query: "SELECT id, sn, imei, configuration, warranty_status, purchased_on, notes \
                FROM devices",
    },
    TableExport {
        table: "repairs",
        file_name: "repairs.csv",
        header: &[
            "ID",
            "ORDER_ID",
            "DEVICE_ID",
            "USER_ID",
            "SUBMITTED_AT",
            "COMPLETED_AT",
            "REQUEST_REVIEW",
            "TECH_ID",
            "UNIT_RECEIVED",
            "CONFIRMATION",
            "REFERENCE",
            "SYMPTOM",
            "DIAGNOSIS",
            "NOTES",
        ],
        // Unsubmitted repairs are drafts and stay private to the service desk.
        query: "SELECT id, order_id, device_id, created_by_id, submitted_at, completed_at, \
                request_review, tech_id, unit_received_at, confirmation, reference, \
                symptom, diagnosis, notes \
                FROM repairs WHERE submitted_at IS NOT NULL",
    },
    TableExport {
        table: "products",
        file_name: "products.csv",
        header: &[
            "ID",
            "CODE",
            "TITLE",
            "DESCRIPTION",
            "PRICE_PURCHASE_EXCHANGE",
            "PRICE_PURCHASE_STOCK",
            "PRICE_SALES_EXCHANGE",
            "PRICE_SALES_STOCK",
            "COMPONENT_CODE",
            "PART_TYPE",
            "EEE_CODE",
        ],
        query: "SELECT id, code, title, description, price_purchase_exchange, \
                price_purchase_stock, price_sales_exchange, price_sales_stock, \
                component_code, part_type, eee_code \
                FROM products",
    },
    TableExport {
        table: "customers",
        file_name: "customers.csv",
        header: &[
            "ID",
            "PARENT_ID",
            "NAME",
            "PHONE",
            "EMAIL",
            "STREET_ADDRESS",
            "POSTAL_CODE",
            "CITY",
            "COUNTRY",
            "NOTES",
        ],
        query: "SELECT id, parent_id, name, phone, email, street_address, zip_code, \
                city, country, notes \
                FROM customers",
    },
    TableExport {
        table: "order_items",
        file_name: "order_products.csv",
        header: &[
            "ID",
            "PRODUCT_ID",
            "ORDER_ID",
            "CODE",
            "TITLE",
            "DESCRIPTION",
            "AMOUNT",
            "SERIAL_NUMBER",
            "KBB_SN",
            "IMEI",
            "REPORTED",
            "PRICE_CATEGORY",
            "PRICE",
            "COMPTIA_CODE",
            "COMPTIA_MODIFIER",
        ],
        query: "SELECT id, product_id, order_id, code, title, description, amount, \
                sn, kbb_sn, imei, should_report, price_category, price, \
                comptia_code, comptia_modifier \
                FROM order_items",
    },
    TableExport {
        table: "service_parts",
        file_name: "parts.csv",
        header: &[
            "ID",
            "REPAIR_ID",
            "ORDER_ITEM_ID",
            "NUMBER",
            "TITLE",
            "COMPTIA_CODE",
            "COMPTIA_MODIFIER",
            "RETURN_ORDER",
            "RETURN_STATUS",
            "RETURN_CODE",
            "ORDER_STATUS",
            "COVERAGE",
            "SHIP_TO",
            "RETURNED_AT",
        ],
        query: "SELECT id, repair_id, order_item_id, part_number, part_title, \
                comptia_code, comptia_modifier, return_order, return_status, \
                return_code, order_status, coverage_description, ship_to, returned_at \
                FROM service_parts",
    },
    TableExport {
        table: "order_devices",
        file_name: "order_devices.csv",
        header: &["ID", "ORDER_ID", "DEVICE_ID", "REPORTED"],
        query: "SELECT id, order_id, device_id, should_report FROM order_devices",
    },
];
