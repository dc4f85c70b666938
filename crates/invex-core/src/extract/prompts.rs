//! The fixed prompt catalog, one prompt per target table.

use std::fmt;
use std::str::FromStr;

const INVOICE_INFO_PROMPT: &str = "\
This image contains tabular invoice data. Please extract the following columns:
- Date
- Seller Name
- Seller GST
- Seller Email ID
- Seller Mobile No.
- Buyer Name
- Buyer GSTN
- Buyer Mobile No.
- Seller Invoice No
- Discount
If any value is missing, set it as NaN. Return the data as a CSV string with headers.";

const ITEM_DETAILS_PROMPT: &str = "\
This image contains tabular invoice data. Please extract the following columns:
- Date
- Seller Invoice No
- Seller GST
- Item_Service Name
- Batch
- Expiary Date
- Quantity/QTY
- Unit Of Measurement
- Rate
- MRP
- Amount
If any value is missing, set it as NaN. Return the data as a CSV string with headers.";

const TAX_DETAILS_PROMPT: &str = "\
This image contains tabular invoice data. Please extract the following columns:
- Date
- Seller Invoice No
- Seller GST
- HSN/SAC Code
- Amount
- Taxable amount
- Central tax rate%
- CGST amount
- State tax rate%
- SGST amount
- Total tax amount
If any value is missing, set it as NaN. Return the data as a CSV string with headers.";

/// The three tables extracted from every invoice, in catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// Invoice header: parties, identifiers, discount.
    InvoiceInfo,
    /// One row per billed item or service.
    ItemDetails,
    /// Tax breakdown per HSN/SAC code.
    TaxDetails,
}

impl TableKind {
    /// All kinds in the order they are prompted and stored.
    pub const ALL: [TableKind; 3] = [
        TableKind::InvoiceInfo,
        TableKind::ItemDetails,
        TableKind::TaxDetails,
    ];

    /// Position in the catalog (0-based).
    pub fn index(self) -> usize {
        match self {
            TableKind::InvoiceInfo => 0,
            TableKind::ItemDetails => 1,
            TableKind::TaxDetails => 2,
        }
    }

    /// Whether this is the last prompt sent for an image.
    pub fn is_last(self) -> bool {
        self.index() == Self::ALL.len() - 1
    }

    /// Sheet name used in the workbook store.
    pub fn sheet_name(self) -> &'static str {
        match self {
            TableKind::InvoiceInfo => "Invoice Info",
            TableKind::ItemDetails => "Item Details",
            TableKind::TaxDetails => "Tax Details",
        }
    }

    /// Short identifier used on the command line.
    pub fn slug(self) -> &'static str {
        match self {
            TableKind::InvoiceInfo => "invoice-info",
            TableKind::ItemDetails => "item-details",
            TableKind::TaxDetails => "tax-details",
        }
    }

    /// Extraction instruction sent alongside the image.
    pub fn prompt(self) -> &'static str {
        match self {
            TableKind::InvoiceInfo => INVOICE_INFO_PROMPT,
            TableKind::ItemDetails => ITEM_DETAILS_PROMPT,
            TableKind::TaxDetails => TAX_DETAILS_PROMPT,
        }
    }

    /// Columns the prompt asks the model for.
    pub fn requested_columns(self) -> Vec<&'static str> {
        self.prompt()
            .lines()
            .filter_map(|line| line.strip_prefix("- "))
            .collect()
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sheet_name())
    }
}

impl FromStr for TableKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TableKind::ALL
            .into_iter()
            .find(|kind| kind.slug() == s || kind.sheet_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown table: {s}"))
    }
}
