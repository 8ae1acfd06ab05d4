//! Static product list served for the mock `supplier1` marketplace.

use crate::error::ProxyError;
use crate::products::{Price, ProductSummary, Refinement, RefinementValue, SearchResponse};

/// `(id, title, price, placeholder color, placeholder text)`
const PRODUCTS: [(&str, &str, f64, &str, &str); 8] = [
    (
        "SUP001",
        "Premium Office Chair - Ergonomic Design with Lumbar Support",
        299.99,
        "4CAF50",
        "Office+Chair",
    ),
    (
        "SUP002",
        "Wireless Bluetooth Headphones - Noise Cancelling Technology",
        149.99,
        "2196F3",
        "Headphones",
    ),
    (
        "SUP003",
        "Smart LED Desk Lamp with USB Charging Port",
        79.99,
        "FF9800",
        "Desk+Lamp",
    ),
    (
        "SUP004",
        "Mechanical Gaming Keyboard - RGB Backlit Keys",
        129.99,
        "9C27B0",
        "Keyboard",
    ),
    (
        "SUP005",
        "Portable External Hard Drive - 2TB Storage Capacity",
        89.99,
        "607D8B",
        "Hard+Drive",
    ),
    (
        "SUP006",
        "Wireless Mouse - Precision Optical Sensor",
        39.99,
        "795548",
        "Mouse",
    ),
    (
        "SUP007",
        "Standing Desk Converter - Adjustable Height Workstation",
        199.99,
        "FF5722",
        "Standing+Desk",
    ),
    (
        "SUP008",
        "USB-C Hub - Multi-Port Adapter with HDMI Output",
        59.99,
        "3F51B5",
        "USB+Hub",
    ),
];

const CURRENCY: &str = "USD";

/// Values reported by the fixed `/api/supplier1` listing.
pub const LISTING_TOTAL_RESULTS: u64 = 30;
pub const LISTING_NUMBER_OF_PAGES: u64 = 4;
pub const LISTING_PAGE_SIZE: u32 = 8;

pub fn products() -> Vec<ProductSummary> {
    PRODUCTS
        .iter()
        .map(|(id, title, amount, color, text)| ProductSummary {
            asin: (*id).to_owned(),
            title: (*title).to_owned(),
            image: Some(format!(
                "https://via.placeholder.com/300x300/{color}/FFFFFF?text={text}"
            )),
            price: Some(Price::new(*amount, CURRENCY)),
            url: Some("#".to_owned()),
            has_add_to_cart: true,
        })
        .collect()
}

fn refinement(
    selection_type: &str,
    display_value: &str,
    values: &[(&str, &str, Option<u32>)],
) -> Refinement {
    Refinement {
        selection_type: selection_type.to_owned(),
        display_value: display_value.to_owned(),
        refinement_values: values
            .iter()
            .map(|(value, name, count)| RefinementValue {
                search_refinement_value: (*value).to_owned(),
                display_name: (*name).to_owned(),
                count: *count,
            })
            .collect(),
    }
}

pub fn refinements() -> Vec<Refinement> {
    vec![
        refinement(
            "InsteadSelect",
            "Category",
            &[
                ("electronics", "Electronics", Some(15)),
                ("office", "Office Supplies", Some(12)),
                ("furniture", "Furniture", Some(8)),
            ],
        ),
        refinement(
            "MultiSelectOR",
            "Price Range",
            &[
                ("under50", "Under $50", Some(5)),
                ("50to100", "$50 - $100", Some(8)),
                ("100to200", "$100 - $200", Some(10)),
                ("over200", "Over $200", Some(7)),
            ],
        ),
        refinement(
            "SingleSelect",
            "Brand",
            &[
                ("supplier1_premium", "Supplier1 Premium", None),
                ("supplier1_standard", "Supplier1 Standard", None),
                ("supplier1_budget", "Supplier1 Budget", None),
            ],
        ),
    ]
}

/// Fixed first page with every product.
pub fn listing() -> SearchResponse<Refinement> {
    SearchResponse {
        total_results: Some(LISTING_TOTAL_RESULTS),
        number_of_pages: Some(LISTING_NUMBER_OF_PAGES),
        current_page: 0,
        page_size: LISTING_PAGE_SIZE,
        search_refinements: refinements(),
        products: products(),
    }
}

/// Returns the zero-based `page_number` slice of the catalog.
/// Pages past the end are empty.
pub fn page(page_number: u32, page_size: u32) -> Result<SearchResponse<Refinement>, ProxyError> {
    if page_size == 0 {
        return Err(ProxyError::InvalidRequest(
            "pageSize must be greater than zero".to_owned(),
        ));
    }

    let all = products();
    let total = all.len();
    let start = (page_number as usize).saturating_mul(page_size as usize);
    let end = start.saturating_add(page_size as usize).min(total);

    let products = if start < total {
        all[start..end].to_vec()
    } else {
        Vec::new()
    };

    Ok(SearchResponse {
        total_results: Some(total as u64),
        number_of_pages: Some((total as u64).div_ceil(page_size as u64)),
        current_page: page_number,
        page_size,
        search_refinements: refinements(),
        products,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(page: &SearchResponse<Refinement>) -> Vec<&str> {
        page.products.iter().map(|p| p.asin.as_str()).collect()
    }

    #[test]
    fn it_builds_products_with_placeholder_images() {
        let products = products();

        assert_eq!(products.len(), 8);
        assert_eq!(
            products[0].image.as_deref(),
            Some("https://via.placeholder.com/300x300/4CAF50/FFFFFF?text=Office+Chair")
        );
        assert_eq!(products[7].price.as_ref().unwrap().formatted, "USD 59.99");
        assert!(products.iter().all(|p| p.has_add_to_cart));
    }

    #[test]
    fn it_paginates_first_page() {
        let page = page(0, 3).unwrap();

        assert_eq!(ids(&page), ["SUP001", "SUP002", "SUP003"]);
        assert_eq!(page.total_results, Some(8));
        assert_eq!(page.number_of_pages, Some(3));
    }

    #[test]
    fn it_paginates_last_partial_page() {
        let page = page(2, 3).unwrap();

        assert_eq!(ids(&page), ["SUP007", "SUP008"]);
        assert_eq!(page.current_page, 2);
    }

    #[test]
    fn it_returns_empty_page_past_the_end() {
        let page = page(5, 3).unwrap();

        assert!(page.products.is_empty());
        assert_eq!(page.search_refinements.len(), 3);
    }

    #[test]
    fn it_rejects_zero_page_size() {
        assert!(matches!(page(0, 0), Err(ProxyError::InvalidRequest(_))));
    }

    #[test]
    fn it_omits_counts_for_brand_refinement() {
        let value = serde_json::to_value(refinements()).unwrap();

        assert_eq!(value[0]["refinementValues"][0]["count"], 15);
        assert!(value[2]["refinementValues"][0].get("count").is_none());
    }

    #[test]
    fn it_reports_fixed_listing_totals() {
        let listing = listing();

        assert_eq!(listing.total_results, Some(30));
        assert_eq!(listing.number_of_pages, Some(4));
        assert_eq!(listing.page_size, 8);
        assert_eq!(listing.products.len(), 8);
    }
}
