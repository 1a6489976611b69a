//! Customer sites around Las Vegas / Henderson.
//!
//! Coordinates from OpenStreetMap; all of them route on OSRM Nevada data.

use route_optimizer::traits::{Coordinates, Location};

/// A named customer site.
#[derive(Debug, Clone, Copy)]
pub struct Site {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Site {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn location(&self) -> Location {
        Location::Coordinates(Coordinates::new(self.lat, self.lng))
    }
}

/// Where technicians pick up parts before the first job.
pub const SHOP: Site = Site::new("Shop", 36.1070664, -115.0591256);

/// Sites along the Strip, listed north to south.
pub const STRIP_SITES: &[Site] = &[
    Site::new("Sinatra", 36.1300035, -115.1654850),
    Site::new("Wynn Las Vegas", 36.1263781, -115.1658180),
    Site::new("Grimaldi's Pizzeria", 36.1248850, -115.1683540),
    Site::new("CUT", 36.1233879, -115.1682073),
    Site::new("Social Life Pizza", 36.1210052, -115.1684273),
    Site::new("Hash House A Go Go", 36.1181377, -115.1710989),
    Site::new("Brooklyn Bowl", 36.1175388, -115.1695094),
    Site::new("Caesars Palace", 36.1162, -115.1745),
    Site::new("Spago by Wolfgang Puck", 36.1139368, -115.1741462),
    Site::new("P.F. Chang's", 36.1103352, -115.1723830),
    Site::new("Emeril's New Orleans Fish House", 36.1028578, -115.1688386),
    Site::new("Strip Steak", 36.0908722, -115.1776176),
];

/// Sites east of the Strip and out toward Henderson.
pub const EAST_SITES: &[Site] = &[
    Site::new("Pizza Hut East", 36.1305215, -115.1093500),
    Site::new("Hello Tokyo", 36.1161627, -115.0902096),
    Site::new("Viva El Salvador", 36.1013492, -115.0646473),
    Site::new("Sushi Twister", 36.1007300, -115.0526259),
    Site::new("Sunset Station Area", 36.0614, -115.0631),
    Site::new("Naga", 36.0137634, -114.9928676),
];

/// The Strip sites in an order that zig-zags north and south, the way a
/// day booked first-come-first-served tends to look.
pub fn zigzag_strip_day() -> Vec<Site> {
    let n = STRIP_SITES.len();
    (0..n)
        .map(|k| if k % 2 == 0 { STRIP_SITES[k / 2] } else { STRIP_SITES[n - 1 - k / 2] })
        .collect()
}

