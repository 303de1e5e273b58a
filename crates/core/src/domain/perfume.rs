use serde::{Deserialize, Deserializer, Serialize};

use crate::canonical::canonicalize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
    #[default]
    Unisex,
}

impl Sex {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Unisex => "unisex",
        }
    }

    /// Unknown or blank labels fall back to unisex.
    pub fn from_label(label: &str) -> Self {
        match canonicalize(label).as_str() {
            "male" | "m" | "men" => Self::Male,
            "female" | "f" | "women" => Self::Female,
            _ => Self::Unisex,
        }
    }

    pub fn is_opposite(self, other: Sex) -> bool {
        matches!((self, other), (Self::Male, Self::Female) | (Self::Female, Self::Male))
    }
}

impl<'de> Deserialize<'de> for Sex {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Sex::from_label).unwrap_or_default())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Perfume {
    #[serde(default, deserialize_with = "nullable")]
    pub brand: String,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default)]
    pub sex: Sex,
    #[serde(default, deserialize_with = "nullable")]
    pub image_url: String,
    #[serde(default, deserialize_with = "nullable")]
    pub properties: Properties,
    #[serde(default, deserialize_with = "nullable")]
    pub shops: Vec<ShopInfo>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Properties {
    #[serde(default, deserialize_with = "nullable")]
    pub perfume_type: String,
    #[serde(default, deserialize_with = "nullable")]
    pub family: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub upper_notes: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub core_notes: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub base_notes: Vec<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub enriched_upper_notes: Vec<EnrichedNote>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub enriched_core_notes: Vec<EnrichedNote>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Vec::is_empty")]
    pub enriched_base_notes: Vec<EnrichedNote>,
}

/// A note annotated with descriptive tags (`"citrus"`, `"warm"`, ...).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedNote {
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopInfo {
    #[serde(default, deserialize_with = "nullable")]
    pub shop_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub domain: String,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "String::is_empty")]
    pub image_url: String,
    #[serde(default, deserialize_with = "nullable")]
    pub variants: Vec<Variant>,
}

impl ShopInfo {
    pub fn same_shop(&self, other: &ShopInfo) -> bool {
        self.shop_name == other.shop_name && self.domain == other.domain
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    #[serde(default)]
    pub volume: i32,
    #[serde(default)]
    pub price: i32,
    #[serde(default, deserialize_with = "nullable")]
    pub link: String,
}

/// Canonical `(brand, name, sex)` triple. Two perfumes are the same iff
/// their identities are equal.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PerfumeIdentity {
    pub brand: String,
    pub name: String,
    pub sex: Sex,
}

/// Canonical `(brand, name)` pair: the gluing key and the advisor
/// shortlist key. Sex is deliberately absent.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlueKey {
    pub brand: String,
    pub name: String,
}

impl GlueKey {
    pub fn new(brand: &str, name: &str) -> Self {
        Self { brand: canonicalize(brand), name: canonicalize(name) }
    }
}

impl Perfume {
    pub fn identity(&self) -> PerfumeIdentity {
        PerfumeIdentity {
            brand: canonicalize(&self.brand),
            name: canonicalize(&self.name),
            sex: self.sex,
        }
    }

    pub fn glue_key(&self) -> GlueKey {
        GlueKey::new(&self.brand, &self.name)
    }

    pub fn same_as(&self, other: &Perfume) -> bool {
        self.sex == other.sex
            && canonicalize(&self.brand) == canonicalize(&other.brand)
            && canonicalize(&self.name) == canonicalize(&other.name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ranked {
    pub perfume: Perfume,
    pub rank: u32,
    #[serde(rename = "similarity_score")]
    pub score: f64,
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
