//! Invoicing service client. Packs are mirrored there as products.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{entity::pack, prelude::*};

#[derive(Debug, Serialize)]
pub struct ProductParams<'a> {
  pub name: &'a str,
  pub price: f64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<&'a str>,
}

impl<'a> From<&'a pack::Model> for ProductParams<'a> {
  fn from(pack: &'a pack::Model) -> Self {
    let price = pack.price * (1.0 - pack.discount / 100.0);
    Self {
      name: &pack.title,
      price: (price * 100.0).round() / 100.0,
      description: pack.description.as_deref(),
    }
  }
}

#[derive(Debug, Deserialize)]
struct Product {
  #[serde(alias = "_id")]
  id: String,
}

#[derive(Clone)]
pub struct Invoicing {
  client: Client,
  base_url: String,
  token: String,
}

impl Invoicing {
  pub fn new(base_url: String, token: String) -> Self {
    let base_url = base_url.trim_end_matches('/').to_string();
    Self { client: Client::new(), base_url, token }
  }

  /// Creates a product and returns its id.
  pub async fn create_product(&self, params: &ProductParams<'_>) -> Result<String> {
    let url = format!("{}/products", self.base_url);
    let response = self
      .client
      .post(&url)
      .bearer_auth(&self.token)
      .json(params)
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      return Err(Error::Upstream(format!(
        "Invoicing service returned {status}"
      )));
    }

    let product: Product = response.json().await?;
    info!("Invoicing product `{}` created for `{}`", product.id, params.name);
    Ok(product.id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_discounted_price() {
    let pack = pack::Model {
      id: 1,
      title: "Classics".into(),
      level: "B2".into(),
      description: None,
      age: None,
      img: None,
      faq: None,
      duration: Some(30),
      book_number: 0,
      price: 120.0,
      discount: 25.0,
      public: true,
      invoice_product_id: None,
      created_at: utils::now(),
    };

    let params = ProductParams::from(&pack);
    assert_eq!(params.price, 90.0);
    assert_eq!(params.name, "Classics");

    let body = json::to_value(&params).unwrap();
    assert!(body.get("description").is_none());
  }
}
