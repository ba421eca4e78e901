//! Item id → display image path. A missing mapping is not an error.

use crate::{config::DropTable, types::ItemId};
use std::collections::HashMap;

pub const DEFAULT_IMAGE_BASE: &str = "/assets/images/";

#[derive(Debug, Clone)]
pub struct AssetResolver {
    base:   String,
    images: HashMap<ItemId, String>,
}

impl AssetResolver {
    /// Collect image files for uniques, the currency and the flavor pool.
    pub fn from_table(table: &DropTable, base: &str) -> Self {
        let uniques = table.items.iter().map(|i| (&i.id, &i.image));
        let commons = table.common_loot.iter().map(|c| (&c.id, &c.image));
        let currency = std::iter::once((&table.currency.id, &table.currency.image));

        let images = uniques
            .chain(commons)
            .chain(currency)
            .filter_map(|(id, image)| image.as_ref().map(|file| (id.clone(), file.clone())))
            .collect();

        Self { base: base.to_string(), images }
    }

    pub fn image_path(&self, item_id: &str) -> Option<String> {
        self.images
            .get(item_id)
            .map(|file| format!("{}{}", self.base, file))
    }
}
