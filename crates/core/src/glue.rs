//! Collapses catalog rows that describe the same perfume.
//!
//! The hub may return one row per shop or per volume. Rows sharing a
//! canonical `(brand, name)` become one perfume: properties, sex and brand
//! spelling come from the first row seen, shops accumulate. Shops with the
//! same `(shop_name, domain)` merge their variants, deduplicated by volume
//! with the later price and link winning.

use std::collections::HashMap;

use crate::domain::{GlueKey, Perfume, ShopInfo, Variant};

/// Output keeps the first-seen order of distinct keys and is a fixed point:
/// `glue(glue(xs)) == glue(xs)`.
pub fn glue(records: impl IntoIterator<Item = Perfume>) -> Vec<Perfume> {
    let mut glued: Vec<Perfume> = Vec::new();
    let mut positions: HashMap<GlueKey, usize> = HashMap::new();

    for mut record in records {
        let key = record.glue_key();
        match positions.get(&key) {
            Some(&position) => absorb(&mut glued[position], record),
            None => {
                positions.insert(key, glued.len());
                let shops = std::mem::take(&mut record.shops);
                for shop in shops {
                    merge_shop(&mut record.shops, shop);
                }
                glued.push(record);
            }
        }
    }

    glued
}

fn absorb(target: &mut Perfume, record: Perfume) {
    if target.image_url.is_empty() && !record.image_url.is_empty() {
        target.image_url = record.image_url;
    }
    for shop in record.shops {
        merge_shop(&mut target.shops, shop);
    }
}

fn merge_shop(shops: &mut Vec<ShopInfo>, mut incoming: ShopInfo) {
    let Some(existing) = shops.iter_mut().find(|shop| shop.same_shop(&incoming)) else {
        let variants = std::mem::take(&mut incoming.variants);
        for variant in variants {
            merge_variant(&mut incoming.variants, variant);
        }
        shops.push(incoming);
        return;
    };

    if existing.image_url.is_empty() {
        existing.image_url = incoming.image_url;
    }
    for variant in incoming.variants {
        merge_variant(&mut existing.variants, variant);
    }
}

fn merge_variant(variants: &mut Vec<Variant>, incoming: Variant) {
    match variants.iter_mut().find(|variant| variant.volume == incoming.volume) {
        Some(existing) => *existing = incoming,
        None => variants.push(incoming),
    }
}
