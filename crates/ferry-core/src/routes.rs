//! NYC Ferry route catalog.
//!
//! The catalog is static reference data: every route the sign can be
//! configured for, its Onestop id, boat color, headsigns and stops. Nothing
//! here is computed from the network.
//!
//! Stops are addressed in HTML forms by a *short key*, the last `-`-separated
//! segment of the full stop id (`s-dr5rvw38kz-astoria` → `astoria`). Short
//! keys are unique within a route, not globally.

/// A stop as listed in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopEntry {
    /// Full Onestop stop id.
    pub full_id: &'static str,
    /// Rider-facing stop name.
    pub name: &'static str,
}

impl StopEntry {
    /// Short key used in form values.
    pub fn short_key(&self) -> &'static str {
        short_key(self.full_id)
    }
}

/// A route in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteEntry {
    /// Short route code (e.g. "AS").
    pub code: &'static str,
    /// Route name without the code (e.g. "Astoria").
    pub name: &'static str,
    /// Full Onestop route id.
    pub full_id: &'static str,
    /// Boat glyph color.
    pub color: &'static str,
    /// Valid trip headsigns, in catalog order.
    pub headsigns: &'static [&'static str],
    /// Stops as listed; may contain entries sharing a short key.
    pub stops: &'static [StopEntry],
}

impl RouteEntry {
    /// Display name, e.g. "AS (Astoria)".
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.code, self.name)
    }

    /// Stops keyed by short key.
    ///
    /// When two catalog entries share a short key the later one wins, but
    /// keeps the position of the first.
    pub fn stops(&self) -> Vec<StopEntry> {
        let mut stops: Vec<StopEntry> = Vec::with_capacity(self.stops.len());
        for stop in self.stops {
            match stops
                .iter_mut()
                .find(|s| s.short_key() == stop.short_key())
            {
                Some(existing) => *existing = *stop,
                None => stops.push(*stop),
            }
        }
        stops
    }

    /// Stops sorted alphabetically by name.
    pub fn sorted_stops(&self) -> Vec<StopEntry> {
        let mut stops = self.stops();
        stops.sort_by(|a, b| a.name.cmp(b.name));
        stops
    }

    /// Resolve a stop short key to its catalog entry.
    pub fn resolve_stop(&self, key: &str) -> Option<StopEntry> {
        self.stops().into_iter().find(|s| s.short_key() == key)
    }
}

/// Derive the short key from a full Onestop id.
pub fn short_key(full_id: &str) -> &str {
    full_id.rsplit('-').next().unwrap_or(full_id)
}

/// Read-only view over a route catalog.
#[derive(Debug, Clone, Copy)]
pub struct RouteTable {
    routes: &'static [RouteEntry],
}

impl RouteTable {
    /// Wrap a static catalog.
    pub const fn new(routes: &'static [RouteEntry]) -> Self {
        Self { routes }
    }

    /// The NYC Ferry catalog shipped with the sign.
    pub const fn nyc_ferry() -> Self {
        Self::new(NYC_FERRY_ROUTES)
    }

    /// All routes in catalog order.
    pub fn routes(&self) -> &'static [RouteEntry] {
        self.routes
    }

    /// Look up a route by its short code.
    pub fn route(&self, code: &str) -> Option<&'static RouteEntry> {
        self.routes.iter().find(|r| r.code == code)
    }

    /// Look up a route by its full Onestop id.
    pub fn route_by_full_id(&self, full_id: &str) -> Option<&'static RouteEntry> {
        self.routes.iter().find(|r| r.full_id == full_id)
    }

    /// Routes sorted alphabetically by display name.
    pub fn routes_sorted_by_name(&self) -> Vec<&'static RouteEntry> {
        let mut routes: Vec<&'static RouteEntry> = self.routes.iter().collect();
        routes.sort_by_key(|r| r.display_name());
        routes
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::nyc_ferry()
    }
}

macro_rules! stop {
    ($id:literal, $name:literal) => {
        StopEntry {
            full_id: $id,
            name: $name,
        }
    };
}

const WALL_ST: StopEntry = stop!("s-dr5recy35g-wallst~pier11", "Wall St/Pier 11");
const EAST_34TH: StopEntry = stop!("s-dr5ruc0nmp-east34thstreet", "East 34th Street");
const EAST_90TH: StopEntry = stop!("s-dr5rvrkfn8-east90thst", "East 90th St");
const LONG_ISLAND_CITY: StopEntry = stop!("s-dr5rv418u0-longislandcity", "Long Island City");
const DUMBO: StopEntry = stop!("s-dr5rs1vgzy-dumbo~fultonferry", "Dumbo/Fulton Ferry");
const GREENPOINT: StopEntry = stop!("s-dr5rsyvm6u-greenpoint", "Greenpoint");
const GOV_ISLAND: StopEntry = stop!("s-dr5r7wybfg-govisland~yankeepier", "Gov. Island/Yankee Pier");
const ROCKAWAY: StopEntry = stop!("s-dr5qzujkr0-rockaway", "Rockaway");
const SUNSET_PARK: StopEntry = stop!("s-dr5r5rrtep-sunsetpark~bat", "Sunset Park/BAT");

const NYC_FERRY_ROUTES: &[RouteEntry] = &[
    RouteEntry {
        code: "AS",
        name: "Astoria",
        full_id: "r-dr5ru-as",
        color: "orange",
        headsigns: &["East 90th St", "Wall St./Pier 11"],
        stops: &[
            stop!("s-dr5rvw38kz-astoria", "Astoria"),
            stop!("s-dr5rs9w14e-brooklynnavyyard", "Brooklyn Navy Yard"),
            EAST_34TH,
            EAST_90TH,
            LONG_ISLAND_CITY,
            stop!("s-dr5rv5t3wk-rooseveltisland", "Roosevelt Island"),
            WALL_ST,
        ],
    },
    RouteEntry {
        code: "ER",
        name: "East River",
        full_id: "r-dr5rs-er",
        color: "teal",
        headsigns: &["Hunters Point South", "Wall St./Pier 11"],
        stops: &[
            DUMBO,
            EAST_34TH,
            GREENPOINT,
            stop!("s-dr5rubz42m-hunterspointsouth", "Hunters Point South"),
            stop!("s-dr5rsvh2hf-northwilliamsburg", "North Williamsburg"),
            stop!("s-dr5rsfb98g-southwilliamsburg", "South Williamsburg"),
            WALL_ST,
        ],
    },
    RouteEntry {
        code: "GI",
        name: "Governors Island Shuttle",
        full_id: "r-dr5re-gi",
        color: "gray",
        headsigns: &["Governors Island", "Wall St./Pier 11"],
        stops: &[GOV_ISLAND, WALL_ST],
    },
    RouteEntry {
        code: "RES",
        name: "Rockaway East",
        full_id: "r-dr5wb-res",
        color: "purple",
        headsigns: &["Rockaway", "Rockaway East"],
        stops: &[
            stop!("s-dr5wcq2205-beachchanneldr~beach41ststreet", "Beach 41st Street"),
            stop!("s-dr5wcq0rrq-beachchanneldr~beach41ststreet", "Beach 41st Street"),
            stop!("s-dr5wbype5v-beachchanneldr~beach54thstreet", "Beach 54th Street"),
            stop!("s-dr5wbyp7vb-beachchanneldr~beach54thstreet", "Beach 54th Street"),
            stop!("s-dr5qzuj6j9-beachchanneldr~beach108thstreet", "Beach 108th Street"),
            stop!("s-dr5wcq6fq2-beachchanneldr~beach36thstreet", "Beach 36th Street"),
            stop!("s-dr5wbtrf2q-rockawaybeachboulevard~beach67thstreet", "Beach 67th Street"),
            stop!("s-dr5wbtr1vm-rockawaybeachboulevard~beach67thstreet", "Beach 67th Street"),
            stop!("s-dr5wbsch36-rockawaybeachboulevard~beach77thstreet", "Beach 77th Street"),
            stop!("s-dr5wbsbe5e-rockawaybeachboulevard~beach79thstreet", "Beach 79th Street"),
            stop!("s-dr5wbku24f-rockawaybeachboulevard~beach86thstreet", "Beach 86th Street"),
            stop!("s-dr5wbksr6y-rockawaybeachboulevard~beach86thstreet", "Beach 86th Street"),
            stop!("s-dr5wbhre7z-rockawaybeachboulevard~beach96thstreet", "Beach 96th Street"),
            stop!("s-dr5wbhr7hu-rockawaybeachboulevard~beach96thstreet", "Beach 96th Street"),
            stop!("s-dr5wbh53by-rockawaybeachboulevard~beach102ndstreet", "Beach 102nd Street"),
        ],
    },
    RouteEntry {
        code: "RR",
        name: "Rockaway Rocket",
        full_id: "r-dr5r-rr",
        color: "coral",
        headsigns: &["Long Island City", "Rockaway"],
        stops: &[GREENPOINT, LONG_ISLAND_CITY, ROCKAWAY],
    },
    RouteEntry {
        code: "RW",
        name: "Rockaway",
        full_id: "r-dr5r-rw",
        color: "purple",
        headsigns: &["Rockaway", "Wall St./Pier 11"],
        stops: &[ROCKAWAY, SUNSET_PARK, WALL_ST],
    },
    RouteEntry {
        code: "RWS",
        name: "Rockaway West",
        full_id: "r-dr5qz-rws",
        color: "purple",
        headsigns: &["Rockaway", "Rockaway West"],
        stops: &[
            stop!("s-dr5qzuj6j9-beachchanneldr~beach108thstreet", "Beach Channel Dr/Beach 108th Street"),
            stop!("s-dr5qybzdyx-jacobriisparkroad~bathhouse", "Jacob Riis Park Road/Bath House"),
            stop!("s-dr5qzg0n8w-rockawaybeachboulevard~beach118thstreet", "Rockaway Beach Boulevard & Beach 118th Street"),
            stop!("s-dr5qzepyvw-rockawaybeachboulevard~beach118thstreet", "Rockaway Beach Boulevard & Beach 118th Street"),
            stop!("s-dr5qzdg18b-rockawaybeachboulevard~beach127thstreet", "Rockaway Beach Boulevard & Beach 127th Street"),
            stop!("s-dr5qzdg0cb-rockawaybeachboulevard~beach127thstreet", "Rockaway Beach Boulevard & Beach 127th Street"),
            stop!("s-dr5qz6q16g-rockawaybeachboulevard~beach135thstreet", "Rockaway Beach Boulevard & Beach 135th Street"),
            stop!("s-dr5qz6mbp7-rockawaybeachboulevard~beach135thstreet", "Rockaway Beach Boulevard & Beach 135th Street"),
            stop!("s-dr5qz1mt24-rockawaybeachboulevard~beach149thstreet", "Rockaway Beach Boulevard & Beach 149th Street"),
            stop!("s-dr5qz1qn5q-rockawaybeachboulevard~beach149thstreet", "Rockaway Beach Boulevard & Beach 149th Street"),
            stop!("s-dr5qyc027j-rockawaypointboulevard~beach169thstreet", "Rockaway Point Boulevard & Beach 169th Street"),
        ],
    },
    RouteEntry {
        code: "SB",
        name: "South Brooklyn",
        full_id: "r-dr5r7-sb",
        color: "yellow",
        headsigns: &[
            "Bay Ridge",
            "Bay Ridge Limited",
            "Corlears Hook",
            "Corlears Hook Limited",
            "Red Hook/Atlantic Basin",
            "Sunset Park/BAT Limited",
            "Wall St./Pier 11 Limited",
        ],
        stops: &[
            stop!("s-dr5rkpc3ft-atlanticave~bbppier6", "Atlantic Ave/BBP Pier 6"),
            stop!("s-dr5r5nr06d-bayridge", "Bay Ridge"),
            stop!("s-dr5rse1cye-corlearshook", "Corlears Hook"),
            DUMBO,
            GOV_ISLAND,
            stop!("s-dr5r7v9pgb-redhook~atlanticbasin", "Red Hook/Atlantic Basin"),
            SUNSET_PARK,
            WALL_ST,
        ],
    },
    RouteEntry {
        code: "SG",
        name: "St. George",
        full_id: "r-dr5r-sg",
        color: "pink",
        headsigns: &["Midtown West/W 39th St-Pier 79", "St. George"],
        stops: &[
            stop!("s-dr5reevyhz-batteryparkcity~veseyst", "Battery Park City/Vesey St."),
            stop!("s-dr5rgupyh4-midtownwest~w39thst~pier79", "Midtown West/W 39th St-Pier 79"),
            stop!("s-dr5r4rku92-stgeorge", "St. George"),
        ],
    },
    RouteEntry {
        code: "SV",
        name: "Soundview",
        full_id: "r-dr5r-sv",
        color: "navy",
        headsigns: &["Ferry Point Park", "Wall St./Pier 11"],
        stops: &[
            EAST_34TH,
            EAST_90TH,
            stop!("s-dr72pu3m40-ferrypointpark", "Ferry Point Park"),
            stop!("s-dr72ps1j8q-soundview", "Soundview"),
            stop!("s-dr5rsxn8cz-stuyvesantcove", "Stuyvesant Cove"),
            WALL_ST,
        ],
    },
];
