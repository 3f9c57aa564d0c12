//! Where to bring leftover food: a fixed list of donation points per city.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationPoint {
    pub name: &'static str,
    pub address: &'static str,
    pub map_link: &'static str,
}

const DIRECTORY: &[(&str, &[DonationPoint])] = &[
    (
        "Denton",
        &[
            DonationPoint {
                name: "Monsignor King Outreach Center",
                address: "909 N Loop 288, Denton, TX 76209",
                map_link: "https://www.google.com/maps?q=Monsignor+King+Outreach+Center,+909+N+Loop+288,+Denton,+TX+76209",
            },
            DonationPoint {
                name: "Giving Grace",
                address: "306 N Loop 288, Denton, TX 76209",
                map_link: "https://www.google.com/maps?q=Giving+Grace,+306+N+Loop+288,+Denton,+TX+76209",
            },
        ],
    ),
    (
        "Dallas",
        &[
            DonationPoint {
                name: "Promise House Inc",
                address: "224 W Page Ave, Dallas, TX 75208",
                map_link: "https://www.google.com/maps?q=Promise+House+Inc,+224+W+Page+Ave,+Dallas,+TX+75208",
            },
            DonationPoint {
                name: "The Bridge Homeless Recovery Center",
                address: "1818 Corsicana St, Dallas, TX 75201",
                map_link: "https://www.google.com/maps?q=1818+Corsicana+St,+Dallas,+TX+75201",
            },
        ],
    ),
    (
        "Fort Worth",
        &[
            DonationPoint {
                name: "Presbyterian Night Shelter",
                address: "2400 Cypress St, Fort Worth, TX 76102",
                map_link: "https://www.google.com/maps?q=2400+Cypress+St,+Fort+Worth,+TX+76102",
            },
            DonationPoint {
                name: "The Morris Foundation Women & Children's Center",
                address: "2320 Poplar St, Fort Worth, TX 76102",
                map_link: "https://www.google.com/maps?q=2320+Poplar+St,+Fort+Worth,+TX+76102",
            },
        ],
    ),
];

pub fn cities() -> Vec<&'static str> {
    DIRECTORY.iter().map(|(city, _)| *city).collect()
}

/// Donation points of `city`. Unknown cities have none.
pub fn donation_points(city: &str) -> &'static [DonationPoint] {
    DIRECTORY
        .iter()
        .find(|(name, _)| *name == city)
        .map(|(_, points)| *points)
        .unwrap_or(&[])
}

#[test]
fn test_donation_points() {
    assert_eq!(cities(), ["Denton", "Dallas", "Fort Worth"]);
    assert_eq!(donation_points("Dallas")[0].name, "Promise House Inc");
    assert_eq!(donation_points("Fort Worth").len(), 2);
    assert!(donation_points("").is_empty());
    assert!(donation_points("Austin").is_empty());
}

#[test]
fn test_donation_point_json() {
    let json = serde_json::to_value(&donation_points("Denton")[1]).unwrap();
    assert_eq!(json["name"], "Giving Grace");
    assert!(json["mapLink"].as_str().unwrap().starts_with("https://www.google.com/maps"));
    assert!(json.get("map_link").is_none());
}
