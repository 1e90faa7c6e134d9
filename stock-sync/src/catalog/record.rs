//! Product record validation and normalization
//!
//! Every write payload passes through here before it reaches the store:
//! numbers are coerced, flags defaulted, derived fields recomputed.

use rust_decimal::Decimal;
use serde_json::Value;
use shared::error::ErrorCode;
use shared::models::{Container, Product, ProductCategory, ProductCreate, ProductUpdate, Session, VolumeUnit};

use crate::store::{Document, Fields};
use crate::utils::{CatalogError, CatalogResult};

/// Prefix of generated product codes
pub const CODE_PREFIX: &str = "PROD";

/// Canonical form of a product code (trimmed, upper-case)
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// Numeric suffix of a `PROD###` code
fn code_number(code: &str) -> Option<u64> {
    normalize_code(code)
        .strip_prefix(CODE_PREFIX)
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse().ok())
}

/// Next sequential `PROD###` code after the highest suffix in `products`
pub fn next_product_code<'a>(products: impl IntoIterator<Item = &'a Product>) -> String {
    let next = products
        .into_iter()
        .filter_map(|p| code_number(&p.product_code))
        .max()
        .unwrap_or(0)
        + 1;
    format!("{CODE_PREFIX}{next:03}")
}

/// Fail when `code` is taken by any product other than `exclude_id`
pub fn ensure_code_unique<'a>(
    code: &str,
    products: impl IntoIterator<Item = &'a Product>,
    exclude_id: Option<&str>,
) -> CatalogResult<()> {
    let code = normalize_code(code);
    let taken = products
        .into_iter()
        .filter(|p| exclude_id != Some(p.id.as_str()))
        .any(|p| normalize_code(&p.product_code) == code);
    if taken {
        return Err(CatalogError::DuplicateCode(code));
    }
    Ok(())
}

fn parse_category(raw: &str) -> CatalogResult<ProductCategory> {
    raw.parse().map_err(|_| {
        CatalogError::validation(ErrorCode::CategoryInvalid, format!("unknown category: {raw}"))
    })
}

/// Container only survives for categories that use it
fn parse_container(category: ProductCategory, raw: Option<&str>) -> CatalogResult<Option<Container>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) if category.supports_container() => raw.parse().map(Some).map_err(|_| {
            CatalogError::validation(ErrorCode::ValidationFailed, format!("unknown container: {raw}"))
        }),
        _ => Ok(None),
    }
}

fn parse_volume_unit(raw: &str) -> CatalogResult<VolumeUnit> {
    raw.parse().map_err(|_| {
        CatalogError::validation(ErrorCode::ValidationFailed, format!("unknown volume unit: {raw}"))
    })
}

fn required_name(raw: &str) -> CatalogResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(CatalogError::validation(ErrorCode::ProductNameRequired, "name is required"));
    }
    Ok(name.to_string())
}

fn money(field: &str, value: Option<Decimal>) -> CatalogResult<Decimal> {
    let value = value.unwrap_or_default();
    if value.is_sign_negative() && !value.is_zero() {
        return Err(CatalogError::validation(
            ErrorCode::ProductInvalidPrice,
            format!("{field} must not be negative"),
        ));
    }
    Ok(value)
}

fn count(field: &str, value: Option<i64>) -> CatalogResult<u32> {
    u32::try_from(value.unwrap_or(0)).map_err(|_| {
        CatalogError::validation(ErrorCode::ValueOutOfRange, format!("{field} out of range"))
    })
}

fn volume(value: Option<Decimal>) -> CatalogResult<Option<Decimal>> {
    match value {
        Some(v) if v.is_sign_negative() && !v.is_zero() => Err(CatalogError::validation(
            ErrorCode::ValueOutOfRange,
            "volume must not be negative",
        )),
        other => Ok(other),
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Build a new product from a create payload
///
/// `product_code` is left empty when the payload has none; the caller
/// assigns one. Only administrators may create master records.
pub fn validate_create(draft: ProductCreate, session: &Session, now: i64) -> CatalogResult<Product> {
    let name = required_name(&draft.name)?;
    let category = parse_category(&draft.category)?;
    let container = parse_container(category, draft.container.as_deref())?;
    let cost = money("cost", draft.cost)?;
    let price = money("price", draft.price)?;
    let stock = count("stock", draft.stock)?;
    let min_stock = count("minStock", draft.min_stock)?;
    let volume = volume(draft.volume)?;
    let volume_unit = draft
        .volume_unit
        .as_deref()
        .map(parse_volume_unit)
        .transpose()?
        .unwrap_or_default();

    let is_master = draft.is_master.unwrap_or(false);
    if is_master && !session.is_admin {
        return Err(CatalogError::permission(
            ErrorCode::AdminRequired,
            "only administrators can create master products",
        ));
    }

    Ok(Product {
        id: String::new(),
        product_code: draft.product_code.as_deref().map(normalize_code).unwrap_or_default(),
        name,
        manufacturer: optional_text(draft.manufacturer),
        description: optional_text(draft.description),
        image: optional_text(draft.image),
        category,
        container,
        cost,
        price,
        profit: Product::profit_of(cost, price),
        profit_rate: Product::profit_rate_of(cost, price),
        stock,
        min_stock,
        volume,
        volume_unit,
        is_master,
        is_popular: is_master && draft.is_popular.unwrap_or(false),
        is_active: draft.is_active.unwrap_or(true),
        is_nomihodai: draft.is_nomihodai.unwrap_or(false),
        added_by: session.email.clone(),
        created_at: now,
        updated_at: now,
    })
}

/// Apply a partial update, re-validating and recomputing derived fields
///
/// Stock and the master/popular/active flags are not editable here.
pub fn apply_update(existing: &Product, patch: ProductUpdate, now: i64) -> CatalogResult<Product> {
    let mut product = existing.clone();

    if let Some(name) = patch.name {
        product.name = required_name(&name)?;
    }
    if let Some(code) = patch.product_code {
        product.product_code = normalize_code(&code);
    }
    if let Some(manufacturer) = patch.manufacturer {
        product.manufacturer = optional_text(Some(manufacturer));
    }
    if let Some(description) = patch.description {
        product.description = optional_text(Some(description));
    }
    if let Some(image) = patch.image {
        product.image = optional_text(Some(image));
    }
    if let Some(category) = patch.category {
        product.category = parse_category(&category)?;
    }
    match patch.container {
        Some(raw) => product.container = parse_container(product.category, Some(&raw))?,
        None if !product.category.supports_container() => product.container = None,
        None => {}
    }
    if patch.cost.is_some() {
        product.cost = money("cost", patch.cost)?;
    }
    if patch.price.is_some() {
        product.price = money("price", patch.price)?;
    }
    if patch.min_stock.is_some() {
        product.min_stock = count("minStock", patch.min_stock)?;
    }
    if patch.volume.is_some() {
        product.volume = volume(patch.volume)?;
    }
    if let Some(unit) = patch.volume_unit {
        product.volume_unit = parse_volume_unit(&unit)?;
    }
    if let Some(nomihodai) = patch.is_nomihodai {
        product.is_nomihodai = nomihodai;
    }

    product.profit = Product::profit_of(product.cost, product.price);
    product.profit_rate = Product::profit_rate_of(product.cost, product.price);
    product.updated_at = now;
    Ok(product)
}

/// Document body for a product (the id stays out of the body)
pub fn to_fields(product: &Product) -> CatalogResult<Fields> {
    match serde_json::to_value(product)? {
        Value::Object(map) => Ok(map),
        _ => Err(CatalogError::validation(
            ErrorCode::InternalError,
            "product did not serialize to an object",
        )),
    }
}

pub fn from_document(doc: &Document) -> Result<Product, serde_json::Error> {
    let mut product: Product = doc.decode()?;
    product.id = doc.id.clone();
    Ok(product)
}

/// Partial body touching only `stock` and `updatedAt`
pub fn stock_fields(stock: u32, now: i64) -> Fields {
    let mut fields = Fields::new();
    fields.insert("stock".into(), Value::from(stock));
    fields.insert("updatedAt".into(), Value::from(now));
    fields
}

/// Partial body for a single boolean flag plus `updatedAt`
pub fn flag_fields(field: &str, value: bool, now: i64) -> Fields {
    let mut fields = Fields::new();
    fields.insert(field.into(), Value::from(value));
    fields.insert("updatedAt".into(), Value::from(now));
    fields
}
