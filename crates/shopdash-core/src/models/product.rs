use serde::{Deserialize, Serialize};

/// A catalog product as stored by the shop API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub stock: i64,
    pub sku: String,
    pub ean: String,
    pub title: String,
    pub description: String,
    pub specs: String,
    pub characteristics: String,
    pub price: f64,
    pub main_img: String,
    /// Comma separated image URLs
    pub gallery_imgs: String,
    #[serde(rename = "categorie")]
    pub category: i64,
    pub weight: f64,
    /// Discount in percent
    pub discount: f64,
}

/// Product fields without the server-assigned id, used for create and update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub stock: i64,
    pub sku: String,
    pub ean: String,
    pub title: String,
    pub description: String,
    pub specs: String,
    pub characteristics: String,
    pub price: f64,
    pub main_img: String,
    pub gallery_imgs: String,
    #[serde(rename = "categorie")]
    pub category: i64,
    pub weight: f64,
    pub discount: f64,
}

impl Product {
    /// Price after applying the percentage discount
    pub fn discounted_price(&self) -> f64 {
        let discount = self.discount.clamp(0.0, 100.0);
        self.price * (100.0 - discount) / 100.0
    }

    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Gallery image URLs, skipping empty entries
    pub fn gallery(&self) -> Vec<&str> {
        self.gallery_imgs
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Copy of the editable fields, for pre-filling an update
    pub fn to_draft(&self) -> ProductDraft {
        ProductDraft {
            stock: self.stock,
            sku: self.sku.clone(),
            ean: self.ean.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            specs: self.specs.clone(),
            characteristics: self.characteristics.clone(),
            price: self.price,
            main_img: self.main_img.clone(),
            gallery_imgs: self.gallery_imgs.clone(),
            category: self.category,
            weight: self.weight,
            discount: self.discount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Product {
        let json = r#"{"id":7,"stock":3,"sku":"SK-7","ean":"5940000000007","title":"Lamp",
            "description":"Desk lamp","specs":"","characteristics":"","price":200.0,
            "mainImg":"a.jpg","galleryImgs":"b.jpg, ,c.jpg","categorie":2,"weight":1.5,"discount":25}"#;
        serde_json::from_str(json).expect("valid product JSON")
    }

    #[test]
    fn test_product_parses_wire_names() {
        let p = sample();
        assert_eq!(p.category, 2);
        assert_eq!(p.main_img, "a.jpg");
        assert!(p.in_stock());
    }

    #[test]
    fn test_discounted_price() {
        let mut p = sample();
        assert_eq!(p.discounted_price(), 150.0);
        p.discount = 150.0;
        assert_eq!(p.discounted_price(), 0.0);
    }

    #[test]
    fn test_gallery_skips_blanks() {
        assert_eq!(sample().gallery(), vec!["b.jpg", "c.jpg"]);
    }

    #[test]
    fn test_draft_serializes_category_as_categorie() {
        let value = serde_json::to_value(sample().to_draft()).expect("serializable draft");
        assert_eq!(value["categorie"], 2);
        assert!(value.get("id").is_none());
    }
}
