//! Record codec: one structured record <-> one line of delimited text.
//!
//! Rows are comma-delimited with RFC 4180 quoting (fields containing the
//! delimiter, a quote or a line break are wrapped in `"` with embedded
//! quotes doubled). Decoding is header-driven: a [`Header`] parsed from the
//! file's first line maps column names to positions, so column order in the
//! file is not load-bearing. Multi-valued fields use `|` as a secondary
//! delimiter.

use std::borrow::Cow;
use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::domain::{CustomerInfo, LineItem, Order, OrderStatus, Product};
use crate::{Result, StorefrontError};

/// Canonical column order of the products file.
pub const PRODUCT_COLUMNS: [&str; 11] = [
    "sku", "title", "price", "old_price", "category", "volume_ml", "color", "images", "stock",
    "is_active", "description",
];

/// Canonical column order of the orders file.
pub const ORDER_COLUMNS: [&str; 10] = [
    "order_id", "created_at", "name", "phone", "city", "address", "items", "total", "comment",
    "status",
];

// =============================================================================
// Row framing
// =============================================================================

/// Splits one delimited row into its fields, honoring quoting.
pub fn split_row(line: &str) -> Result<Vec<String>> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
        } else {
            match c {
                '"' if field.is_empty() => in_quotes = true,
                ',' => fields.push(std::mem::take(&mut field)),
                _ => field.push(c),
            }
        }
    }
    if in_quotes {
        return Err(StorefrontError::Parse(format!(
            "unterminated quote in row {line:?}"
        )));
    }
    fields.push(field);
    Ok(fields)
}

/// Joins fields into one row, quoting where the content requires it.
pub fn join_row<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| quote_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

fn quote_field(field: &str) -> Cow<'_, str> {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

// =============================================================================
// Header
// =============================================================================

/// Column map parsed from a file's header row.
#[derive(Clone, Debug)]
pub struct Header {
    columns: HashMap<String, usize>,
}

impl Header {
    pub fn parse(line: &str) -> Result<Self> {
        let cells = split_row(line)?;
        if cells.iter().all(|c| c.trim().is_empty()) {
            return Err(StorefrontError::Parse("empty header row".into()));
        }
        let columns = cells
            .iter()
            .enumerate()
            .map(|(idx, cell)| (cell.trim().to_string(), idx))
            .collect();
        Ok(Self { columns })
    }

    pub fn has(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// Required columns absent from this header, in the order given.
    pub fn missing<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .filter(|col| !self.has(col))
            .copied()
            .collect()
    }

    /// Field value by column name; absent columns read as empty.
    pub fn field<'a>(&self, cells: &'a [String], column: &str) -> &'a str {
        self.columns
            .get(column)
            .and_then(|&idx| cells.get(idx))
            .map_or("", String::as_str)
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.get(column).copied()
    }
}

// =============================================================================
// Product rows
// =============================================================================

pub fn decode_product(header: &Header, line: &str) -> Result<Product> {
    let cells = split_row(line)?;
    let sku = header.field(&cells, "sku").trim().to_string();
    if sku.is_empty() {
        return Err(StorefrontError::Parse("product row without sku".into()));
    }

    let price = parse_decimal(header.field(&cells, "price"), "price")?;
    let old_price_raw = header.field(&cells, "old_price").trim();
    let old_price = if old_price_raw.is_empty() {
        None
    } else {
        Some(parse_decimal(old_price_raw, "old_price")?)
    };

    let stock_raw = header.field(&cells, "stock").trim();
    let stock = if stock_raw.is_empty() {
        0
    } else {
        stock_raw.parse::<u32>().map_err(|_| {
            StorefrontError::Parse(format!("bad stock value {stock_raw:?} for sku {sku}"))
        })?
    };

    // Load-time coercion: anything other than the literal "1" is inactive.
    let is_active = header.field(&cells, "is_active").trim() == "1";

    let images = header
        .field(&cells, "images")
        .split('|')
        .map(str::trim)
        .filter(|img| !img.is_empty())
        .map(String::from)
        .collect();

    Ok(Product {
        sku,
        title: header.field(&cells, "title").trim().to_string(),
        price,
        old_price,
        category: header.field(&cells, "category").trim().to_string(),
        volume_ml: header.field(&cells, "volume_ml").trim().to_string(),
        color: header.field(&cells, "color").trim().to_string(),
        images,
        stock,
        is_active,
        description: header.field(&cells, "description").trim().to_string(),
    })
}

pub fn encode_product(product: &Product) -> String {
    let fields: [String; 11] = [
        product.sku.clone(),
        product.title.clone(),
        product.price.to_string(),
        product.old_price.map(|p| p.to_string()).unwrap_or_default(),
        product.category.clone(),
        product.volume_ml.clone(),
        product.color.clone(),
        product.images.join("|"),
        product.stock.to_string(),
        if product.is_active { "1" } else { "0" }.to_string(),
        product.description.clone(),
    ];
    join_row(&fields)
}

fn parse_decimal(raw: &str, column: &str) -> Result<Decimal> {
    raw.trim()
        .parse::<Decimal>()
        .map_err(|_| StorefrontError::Parse(format!("bad {column} value {raw:?}")))
}

// =============================================================================
// Order rows
// =============================================================================

pub fn decode_order(header: &Header, line: &str) -> Result<Order> {
    let cells = split_row(line)?;
    let id_raw = header.field(&cells, "order_id").trim();
    let id = id_raw
        .parse::<u64>()
        .map_err(|_| StorefrontError::Parse(format!("bad order_id {id_raw:?}")))?;

    Ok(Order {
        id,
        created_at: header.field(&cells, "created_at").trim().to_string(),
        customer: CustomerInfo {
            name: header.field(&cells, "name").to_string(),
            phone: header.field(&cells, "phone").to_string(),
            city: header.field(&cells, "city").to_string(),
            address: header.field(&cells, "address").to_string(),
            comment: header.field(&cells, "comment").to_string(),
        },
        items: decode_items(header.field(&cells, "items"))?,
        total: parse_decimal(header.field(&cells, "total"), "total")?,
        status: header.field(&cells, "status").trim().parse::<OrderStatus>()?,
    })
}

pub fn encode_order(order: &Order) -> String {
    let fields: [String; 10] = [
        order.id.to_string(),
        order.created_at.clone(),
        order.customer.name.clone(),
        order.customer.phone.clone(),
        order.customer.city.clone(),
        order.customer.address.clone(),
        encode_items(&order.items),
        order.total.to_string(),
        order.customer.comment.clone(),
        order.status.as_str().to_string(),
    ];
    join_row(&fields)
}

// =============================================================================
// Line items ("sku:qty|sku:qty")
// =============================================================================

pub fn encode_items(items: &[LineItem]) -> String {
    items
        .iter()
        .map(|item| format!("{}:{}", item.sku, item.qty))
        .collect::<Vec<_>>()
        .join("|")
}

pub fn decode_items(raw: &str) -> Result<Vec<LineItem>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    let mut items = Vec::new();
    for segment in raw.split('|') {
        let mut parts = segment.split(':');
        let (sku, qty_raw) = match (parts.next(), parts.next(), parts.next()) {
            (Some(sku), Some(qty), None) => (sku, qty),
            _ => {
                return Err(StorefrontError::Parse(format!(
                    "bad item segment {segment:?}"
                )))
            }
        };
        let qty = qty_raw.trim().parse::<u32>().map_err(|_| {
            StorefrontError::Parse(format!("bad quantity {qty_raw:?} in item segment"))
        })?;
        items.push(LineItem {
            sku: sku.trim().to_string(),
            qty,
        });
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_header() -> Header {
        Header::parse(&PRODUCT_COLUMNS.join(",")).unwrap()
    }

    fn sample_product() -> Product {
        Product {
            sku: "TEA-001".into(),
            title: "Green tea, loose leaf".into(),
            price: Decimal::new(45000, 2),
            old_price: Some(Decimal::new(52000, 2)),
            category: "tea".into(),
            volume_ml: "250".into(),
            color: "green".into(),
            images: vec!["img/tea1.jpg".into(), "img/tea2.jpg".into(), "img/tea3.jpg".into()],
            stock: 12,
            is_active: true,
            description: "Says \"fresh\", tastes fresh".into(),
        }
    }

    #[test]
    fn product_round_trip() {
        let header = product_header();
        let original = sample_product();
        let decoded = decode_product(&header, &encode_product(&original)).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn product_round_trip_without_images_or_old_price() {
        let header = product_header();
        let mut original = sample_product();
        original.images.clear();
        original.old_price = None;
        let decoded = decode_product(&header, &encode_product(&original)).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn split_row_honors_quoting() {
        let fields = split_row(r#"a,"b,c","say ""hi""",d"#).unwrap();
        assert_eq!(fields, vec!["a", "b,c", "say \"hi\"", "d"]);
    }

    #[test]
    fn split_row_rejects_unterminated_quote() {
        assert!(split_row(r#"a,"open"#).is_err());
    }

    #[test]
    fn decode_is_header_driven() {
        // Columns shuffled relative to the canonical order.
        let header = Header::parse("title,sku,is_active,price").unwrap();
        let product = decode_product(&header, "Cup,CUP-1,1,150").unwrap();
        assert_eq!(product.sku, "CUP-1");
        assert_eq!(product.title, "Cup");
        assert!(product.is_active);
        assert_eq!(product.stock, 0); // column absent entirely
    }

    #[test]
    fn non_numeric_price_is_a_parse_failure() {
        let header = product_header();
        let line = "SKU-1,Cup,cheap,,,,,,3,1,";
        assert!(matches!(
            decode_product(&header, line),
            Err(StorefrontError::Parse(_))
        ));
    }

    #[test]
    fn anything_but_literal_one_is_inactive() {
        let header = product_header();
        for flag in ["0", "true", "yes", ""] {
            let line = format!("SKU-1,Cup,10,,,,,,3,{flag},");
            let product = decode_product(&header, &line).unwrap();
            assert!(!product.is_active, "flag {flag:?} should load inactive");
        }
    }

    #[test]
    fn empty_old_price_decodes_to_absent() {
        let header = product_header();
        let product = decode_product(&header, "SKU-1,Cup,10,,,,,,3,1,").unwrap();
        assert_eq!(product.old_price, None);
    }

    #[test]
    fn items_round_trip() {
        let items = vec![
            LineItem { sku: "TEA-001".into(), qty: 2 },
            LineItem { sku: "CUP-9".into(), qty: 1 },
        ];
        let encoded = encode_items(&items);
        assert_eq!(encoded, "TEA-001:2|CUP-9:1");
        assert_eq!(decode_items(&encoded).unwrap(), items);
    }

    #[test]
    fn items_reject_bad_segments() {
        assert!(decode_items("TEA-001").is_err());
        assert!(decode_items("TEA:1:2").is_err());
        assert!(decode_items("TEA-001:lots").is_err());
        assert_eq!(decode_items("").unwrap(), Vec::new());
    }

    #[test]
    fn order_round_trip() {
        let header = Header::parse(&ORDER_COLUMNS.join(",")).unwrap();
        let order = Order {
            id: 100001,
            created_at: "2026-08-28 10:15".into(),
            customer: CustomerInfo {
                name: "Anna, the regular".into(),
                phone: "+7 900 000-00-00".into(),
                city: "Kazan".into(),
                address: "Baumana 1".into(),
                comment: String::new(),
            },
            items: vec![LineItem { sku: "TEA-001".into(), qty: 3 }],
            total: Decimal::new(135000, 2),
            status: OrderStatus::New,
        };
        let decoded = decode_order(&header, &encode_order(&order)).unwrap();
        assert_eq!(decoded, order);
    }

    #[test]
    fn unknown_status_is_a_parse_failure() {
        let header = Header::parse(&ORDER_COLUMNS.join(",")).unwrap();
        let line = "100001,2026-08-28 10:15,A,1,B,C,TEA:1,10,,paid";
        assert!(decode_order(&header, line).is_err());
    }
}
