//! Product Model

use super::serde_helpers;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Beverage category (fixed enumeration)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    Beer,
    /// Cocktails and chuhai
    Cocktail,
    Sake,
    Shochu,
    /// Whisky and brandy
    Whisky,
    Wine,
    /// Champagne and sparkling wine
    Sparkling,
    Awamori,
    SoftDrink,
    NonAlcoholic,
}

impl ProductCategory {
    /// All categories in menu order
    pub const ALL: [ProductCategory; 10] = [
        ProductCategory::Beer,
        ProductCategory::Cocktail,
        ProductCategory::Sake,
        ProductCategory::Shochu,
        ProductCategory::Whisky,
        ProductCategory::Wine,
        ProductCategory::Sparkling,
        ProductCategory::Awamori,
        ProductCategory::SoftDrink,
        ProductCategory::NonAlcoholic,
    ];

    /// Stable storage key
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beer => "beer",
            Self::Cocktail => "cocktail",
            Self::Sake => "sake",
            Self::Shochu => "shochu",
            Self::Whisky => "whisky",
            Self::Wine => "wine",
            Self::Sparkling => "sparkling",
            Self::Awamori => "awamori",
            Self::SoftDrink => "soft_drink",
            Self::NonAlcoholic => "non_alcoholic",
        }
    }

    /// English display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Beer => "Beer",
            Self::Cocktail => "Cocktail & Chuhai",
            Self::Sake => "Sake",
            Self::Shochu => "Shochu",
            Self::Whisky => "Whisky & Brandy",
            Self::Wine => "Wine",
            Self::Sparkling => "Champagne & Sparkling",
            Self::Awamori => "Awamori",
            Self::SoftDrink => "Soft Drink",
            Self::NonAlcoholic => "Non-Alcoholic",
        }
    }

    /// Japanese menu label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Beer => "ビール",
            Self::Cocktail => "カクテル・チューハイ",
            Self::Sake => "日本酒",
            Self::Shochu => "焼酎",
            Self::Whisky => "ウイスキー・ブランデー",
            Self::Wine => "ワイン",
            Self::Sparkling => "シャンパン・スパークリング",
            Self::Awamori => "泡盛",
            Self::SoftDrink => "ソフトドリンク",
            Self::NonAlcoholic => "ノンアルコール",
        }
    }

    /// Only beer is sub-classified by container
    pub fn supports_container(&self) -> bool {
        matches!(self, Self::Beer)
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Unknown category or container name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value: {}", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

impl FromStr for ProductCategory {
    type Err = UnknownVariant;

    /// Accepts the storage key, the English name (case-insensitive) or the
    /// Japanese label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| {
                c.as_str().eq_ignore_ascii_case(trimmed)
                    || c.display_name().eq_ignore_ascii_case(trimmed)
                    || c.label() == trimmed
            })
            .ok_or_else(|| UnknownVariant(trimmed.to_string()))
    }
}

/// Beer container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Container {
    DraftKeg,
    Bottle,
    Can,
}

impl Container {
    pub const ALL: [Container; 3] = [Container::DraftKeg, Container::Bottle, Container::Can];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DraftKeg => "draft_keg",
            Self::Bottle => "bottle",
            Self::Can => "can",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::DraftKeg => "生樽",
            Self::Bottle => "瓶",
            Self::Can => "缶",
        }
    }
}

impl FromStr for Container {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let normalized = trimmed.replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(&normalized) || c.label() == trimmed)
            .ok_or_else(|| UnknownVariant(trimmed.to_string()))
    }
}

/// Unit of the descriptive `volume` field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeUnit {
    #[default]
    Ml,
    L,
}

impl FromStr for VolumeUnit {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ml" => Ok(Self::Ml),
            "l" => Ok(Self::L),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Stock position relative to the reorder threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    OutOfStock,
    Low,
    Normal,
}

fn default_true() -> bool {
    true
}

/// Product entity (master or shop-owned)
///
/// Field names follow the document layout (camelCase). `id` is the store
/// document id and is never written into the document body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default, skip_serializing)]
    pub id: String,
    #[serde(default)]
    pub product_code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub category: ProductCategory,
    /// Beer only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<Container>,
    /// Unit purchase price
    #[serde(default, with = "rust_decimal::serde::float")]
    pub cost: Decimal,
    /// Unit sale price
    #[serde(default, with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// `price - cost`, recomputed on every write
    #[serde(default, with = "rust_decimal::serde::float")]
    pub profit: Decimal,
    /// Percentage of price, recomputed on every write
    #[serde(default, with = "rust_decimal::serde::float")]
    pub profit_rate: Decimal,
    #[serde(default)]
    pub stock: u32,
    /// Reorder threshold
    #[serde(default)]
    pub min_stock: u32,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub volume: Option<Decimal>,
    #[serde(default)]
    pub volume_unit: VolumeUnit,
    #[serde(default)]
    pub is_master: bool,
    /// Onboarding suggestion; only meaningful on master records
    #[serde(default)]
    pub is_popular: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Included in all-you-can-drink plans
    #[serde(default)]
    pub is_nomihodai: bool,
    #[serde(default)]
    pub added_by: String,
    /// Unix millis
    #[serde(default)]
    pub created_at: i64,
    /// Unix millis
    #[serde(default)]
    pub updated_at: i64,
}

impl Product {
    /// `price - cost`
    pub fn profit_of(cost: Decimal, price: Decimal) -> Decimal {
        price - cost
    }

    /// `(price - cost) / price * 100`, or zero when there is no price
    pub fn profit_rate_of(cost: Decimal, price: Decimal) -> Decimal {
        if price > Decimal::ZERO {
            ((price - cost) / price * Decimal::ONE_HUNDRED).round_dp(2)
        } else {
            Decimal::ZERO
        }
    }

    /// Stock valued at cost
    pub fn inventory_value(&self) -> Decimal {
        self.cost * Decimal::from(self.stock)
    }

    /// Profit if the whole stock sells at list price
    pub fn potential_profit(&self) -> Decimal {
        (self.price - self.cost) * Decimal::from(self.stock)
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.stock == 0
    }

    /// In stock but at or below the reorder threshold
    pub fn is_low_stock(&self) -> bool {
        self.stock > 0 && self.stock <= self.min_stock
    }

    pub fn stock_level(&self) -> StockLevel {
        if self.is_out_of_stock() {
            StockLevel::OutOfStock
        } else if self.is_low_stock() {
            StockLevel::Low
        } else {
            StockLevel::Normal
        }
    }

    /// Case-insensitive match against name or manufacturer
    pub fn matches_text(&self, needle_lower: &str) -> bool {
        self.name.to_lowercase().contains(needle_lower)
            || self
                .manufacturer
                .as_deref()
                .is_some_and(|m| m.to_lowercase().contains(needle_lower))
    }
}

/// Create product payload
///
/// Loosely typed on purpose: form inputs and CSV rows deliver numbers as
/// strings. Numeric fields are coerced while deserializing; everything else
/// is checked by the record validator before anything reaches the store.
/// Derived fields (`profit`, `profitRate`) are not accepted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreate {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "serde_helpers::blank_as_none")]
    pub product_code: Option<String>,
    #[serde(default, deserialize_with = "serde_helpers::blank_as_none")]
    pub manufacturer: Option<String>,
    #[serde(default, deserialize_with = "serde_helpers::blank_as_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "serde_helpers::blank_as_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default, deserialize_with = "serde_helpers::blank_as_none")]
    pub container: Option<String>,
    #[serde(default, deserialize_with = "serde_helpers::lenient_decimal")]
    pub cost: Option<Decimal>,
    #[serde(default, deserialize_with = "serde_helpers::lenient_decimal")]
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "serde_helpers::lenient_i64")]
    pub stock: Option<i64>,
    #[serde(default, deserialize_with = "serde_helpers::lenient_i64")]
    pub min_stock: Option<i64>,
    #[serde(default, deserialize_with = "serde_helpers::lenient_decimal")]
    pub volume: Option<Decimal>,
    #[serde(default, deserialize_with = "serde_helpers::blank_as_none")]
    pub volume_unit: Option<String>,
    pub is_master: Option<bool>,
    pub is_popular: Option<bool>,
    pub is_active: Option<bool>,
    pub is_nomihodai: Option<bool>,
}

impl ProductCreate {
    /// Minimal payload with a name and category
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            ..Default::default()
        }
    }
}

/// Update product payload (absent fields are left unchanged)
///
/// `container: Some("")` clears the container.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "serde_helpers::blank_as_none")]
    pub product_code: Option<String>,
    pub manufacturer: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub container: Option<String>,
    #[serde(default, deserialize_with = "serde_helpers::lenient_decimal")]
    pub cost: Option<Decimal>,
    #[serde(default, deserialize_with = "serde_helpers::lenient_decimal")]
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "serde_helpers::lenient_i64")]
    pub min_stock: Option<i64>,
    #[serde(default, deserialize_with = "serde_helpers::lenient_decimal")]
    pub volume: Option<Decimal>,
    pub volume_unit: Option<String>,
    pub is_nomihodai: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn product(cost: Decimal, price: Decimal, stock: u32, min_stock: u32) -> Product {
        serde_json::from_value(serde_json::json!({
            "name": "Test",
            "category": "beer",
        }))
        .map(|mut p: Product| {
            p.cost = cost;
            p.price = price;
            p.stock = stock;
            p.min_stock = min_stock;
            p
        })
        .unwrap()
    }

    #[test]
    fn test_category_parsing_accepts_all_spellings() {
        assert_eq!("beer".parse(), Ok(ProductCategory::Beer));
        assert_eq!("Beer".parse(), Ok(ProductCategory::Beer));
        assert_eq!("ビール".parse(), Ok(ProductCategory::Beer));
        assert_eq!("soft_drink".parse(), Ok(ProductCategory::SoftDrink));
        assert_eq!(
            "ウイスキー・ブランデー".parse(),
            Ok(ProductCategory::Whisky)
        );
        assert!("vodka".parse::<ProductCategory>().is_err());
    }

    #[test]
    fn test_container_parsing() {
        assert_eq!("draft-keg".parse(), Ok(Container::DraftKeg));
        assert_eq!("Bottle".parse(), Ok(Container::Bottle));
        assert_eq!("缶".parse(), Ok(Container::Can));
        assert!("barrel".parse::<Container>().is_err());
    }

    #[test]
    fn test_profit_rate() {
        assert_eq!(Product::profit_rate_of(dec!(100), dec!(200)), dec!(50));
        assert_eq!(Product::profit_rate_of(dec!(125), dec!(450)), dec!(72.22));
        assert_eq!(Product::profit_rate_of(dec!(100), dec!(0)), Decimal::ZERO);
        assert_eq!(Product::profit_of(dec!(50), dec!(80)), dec!(30));
    }

    #[test]
    fn test_stock_level() {
        assert_eq!(product(dec!(1), dec!(2), 0, 3).stock_level(), StockLevel::OutOfStock);
        assert_eq!(product(dec!(1), dec!(2), 3, 3).stock_level(), StockLevel::Low);
        assert_eq!(product(dec!(1), dec!(2), 4, 3).stock_level(), StockLevel::Normal);
    }

    #[test]
    fn test_value_and_potential_profit() {
        let p = product(dec!(100), dec!(200), 5, 2);
        assert_eq!(p.inventory_value(), dec!(500));
        assert_eq!(p.potential_profit(), dec!(500));
    }

    #[test]
    fn test_document_defaults() {
        let p: Product = serde_json::from_value(serde_json::json!({
            "name": "Kirin Lager",
            "category": "beer",
            "cost": 125,
            "price": 450.5,
        }))
        .unwrap();
        assert!(p.is_active);
        assert!(!p.is_master);
        assert_eq!(p.price, dec!(450.5));
        assert_eq!(p.volume_unit, VolumeUnit::Ml);
    }

    #[test]
    fn test_id_is_not_serialized() {
        let mut p = product(dec!(1), dec!(2), 1, 1);
        p.id = "abc".into();
        let value = serde_json::to_value(&p).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["isActive"], serde_json::json!(true));
        assert_eq!(value["cost"], serde_json::json!(1.0));
    }

    #[test]
    fn test_create_payload_coerces_strings() {
        let draft: ProductCreate = serde_json::from_value(serde_json::json!({
            "name": "Lager 350ml",
            "category": "Beer",
            "cost": "125",
            "price": 450,
            "stock": "24",
            "minStock": "",
            "productCode": "  ",
            "profit": 99999,
        }))
        .unwrap();
        assert_eq!(draft.cost, Some(dec!(125)));
        assert_eq!(draft.price, Some(dec!(450)));
        assert_eq!(draft.stock, Some(24));
        assert_eq!(draft.min_stock, None);
        assert_eq!(draft.product_code, None);
    }
}
