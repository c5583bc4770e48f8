//! Reference vocabulary and sample data.

use chrono::Utc;
use entities::{GUEST_USER_ID, NewDeal, dollars_to_cents};

use crate::{DealStore, StoreResult};

/// Guest marker stored on sample deals so they can be told apart from real
/// anonymous submissions.
pub const SAMPLE_GUEST_ID: &str = "seed";

/// One make and its models.
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub make: &'static str,
    pub models: &'static [&'static str],
}

/// Makes and models loaded by [`seed_catalog`].
pub const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        make: "Toyota",
        models: &[
            "Camry", "Corolla", "RAV4", "Highlander", "Prius", "Sienna", "Tacoma", "Tundra",
            "Avalon", "Venza",
        ],
    },
    CatalogEntry {
        make: "Honda",
        models: &[
            "Civic", "Accord", "CR-V", "Pilot", "Insight", "Passport", "Ridgeline", "HR-V",
            "Odyssey", "Fit",
        ],
    },
    CatalogEntry {
        make: "Ford",
        models: &[
            "F-150", "Mustang", "Explorer", "Escape", "Edge", "Expedition", "Ranger", "Bronco",
            "Maverick", "Transit",
        ],
    },
    CatalogEntry {
        make: "Chevrolet",
        models: &[
            "Silverado", "Equinox", "Malibu", "Tahoe", "Suburban", "Traverse", "Camaro",
            "Corvette", "Colorado", "Blazer",
        ],
    },
    CatalogEntry {
        make: "Nissan",
        models: &[
            "Altima", "Sentra", "Rogue", "Murano", "Pathfinder", "Frontier", "Titan", "Versa",
            "Maxima", "Armada",
        ],
    },
    CatalogEntry {
        make: "BMW",
        models: &[
            "230i", "330i", "430i", "530i", "540i", "M3", "M4", "M5", "X3 xDrive30i",
            "X5 xDrive40i", "X7 xDrive40i", "Z4 sDrive30i", "i4 eDrive40", "iX xDrive50",
        ],
    },
    CatalogEntry {
        make: "Mercedes-Benz",
        models: &[
            "C-Class", "E-Class", "S-Class", "GLC", "GLE", "GLS", "A-Class", "CLA", "GLA", "EQS",
        ],
    },
    CatalogEntry {
        make: "Audi",
        models: &["A4", "A6", "Q5", "Q7", "A3", "Q3", "A8", "Q8", "e-tron", "A5"],
    },
    CatalogEntry {
        make: "Lexus",
        models: &["ES", "RX", "NX", "GX", "LX", "IS", "LS", "UX", "LC", "RC"],
    },
    CatalogEntry {
        make: "Hyundai",
        models: &[
            "Elantra", "Sonata", "Tucson", "Santa Fe", "Palisade", "Kona", "Ioniq", "Genesis",
            "Accent", "Venue",
        ],
    },
    CatalogEntry {
        make: "Kia",
        models: &[
            "Forte", "Optima", "Sportage", "Sorento", "Telluride", "Soul", "Stinger", "Rio",
            "Niro", "Carnival",
        ],
    },
    CatalogEntry {
        make: "Subaru",
        models: &[
            "Outback", "Forester", "Crosstrek", "Impreza", "Legacy", "Ascent", "WRX", "BRZ",
            "Wilderness", "Solterra",
        ],
    },
    CatalogEntry {
        make: "Mazda",
        models: &[
            "Mazda3", "Mazda6", "CX-5", "CX-9", "CX-30", "MX-5 Miata", "CX-50", "Mazda2", "CX-3",
            "RX-8",
        ],
    },
    CatalogEntry {
        make: "Volkswagen",
        models: &[
            "Jetta", "Passat", "Tiguan", "Atlas", "Golf", "Arteon", "ID.4", "Taos", "Beetle", "CC",
        ],
    },
    CatalogEntry {
        make: "Jeep",
        models: &[
            "Wrangler", "Grand Cherokee", "Cherokee", "Compass", "Renegade", "Gladiator",
            "Grand Wagoneer", "Wagoneer", "Patriot", "Liberty",
        ],
    },
    CatalogEntry {
        make: "Tesla",
        models: &["Model 3", "Model Y", "Model S", "Model X", "Cybertruck", "Roadster"],
    },
    CatalogEntry {
        make: "Ram",
        models: &["1500", "2500", "3500", "ProMaster", "ProMaster City"],
    },
    CatalogEntry {
        make: "GMC",
        models: &["Sierra", "Terrain", "Acadia", "Yukon", "Canyon", "Savana", "Hummer EV"],
    },
    CatalogEntry {
        make: "Cadillac",
        models: &["Escalade", "XT5", "XT6", "CT4", "CT5", "Lyriq", "XT4", "Celestiq"],
    },
    CatalogEntry {
        make: "Infiniti",
        models: &["Q50", "Q60", "QX50", "QX60", "QX80", "Q70", "QX30", "Q30"],
    },
];

/// Catalog size reported after seeding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub makes: usize,
    pub models: usize,
}

impl SeedSummary {
    pub fn of_catalog() -> Self {
        Self {
            makes: CATALOG.len(),
            models: CATALOG.iter().map(|entry| entry.models.len()).sum(),
        }
    }
}

/// Upserts every catalog make and model. Safe to run repeatedly.
pub async fn seed_catalog<S: DealStore + ?Sized>(store: &S) -> StoreResult<SeedSummary> {
    for entry in CATALOG {
        let make = store.upsert_make_by_name(entry.make).await?;
        for model in entry.models {
            store.upsert_model_by_name(&make.id, model).await?;
        }
        tracing::info!(make = %entry.make, models = entry.models.len(), "Seeded make");
    }
    Ok(SeedSummary::of_catalog())
}

/// A sample report. Prices are whole dollars.
#[derive(Debug, Clone, Copy)]
struct SampleDeal {
    make: &'static str,
    model: &'static str,
    year: i32,
    trim: &'static str,
    exterior_color: &'static str,
    interior_color: &'static str,
    msrp: f64,
    selling_price: f64,
    otd_price: f64,
    rebates: Option<f64>,
    dealer_name: &'static str,
    dealer_location: &'static str,
    financing: Option<SampleFinancing>,
    notes: &'static str,
}

#[derive(Debug, Clone, Copy)]
struct SampleFinancing {
    rate: f64,
    term: i32,
    down_payment: f64,
    monthly_payment: f64,
}

const SAMPLE_DEALS: &[SampleDeal] = &[
    SampleDeal {
        make: "Ford",
        model: "Bronco",
        year: 2024,
        trim: "Badlands",
        exterior_color: "Area 51",
        interior_color: "Black",
        msrp: 49990.0,
        selling_price: 46800.0,
        otd_price: 50500.0,
        rebates: Some(1000.0),
        dealer_name: "Blue Oval Ford",
        dealer_location: "Austin, TX",
        financing: Some(SampleFinancing {
            rate: 4.9,
            term: 60,
            down_payment: 3000.0,
            monthly_payment: 620.0,
        }),
        notes: "Included tow package and hard top.",
    },
    SampleDeal {
        make: "Subaru",
        model: "WRX",
        year: 2023,
        trim: "Premium 6MT",
        exterior_color: "WR Blue",
        interior_color: "Black",
        msrp: 33495.0,
        selling_price: 31950.0,
        otd_price: 34800.0,
        rebates: Some(500.0),
        dealer_name: "Mountain Subaru",
        dealer_location: "Denver, CO",
        financing: None,
        notes: "No ADM. All-weather mats thrown in.",
    },
    SampleDeal {
        make: "Ram",
        model: "1500",
        year: 2024,
        trim: "Big Horn Crew Cab 4x4",
        exterior_color: "Granite Crystal",
        interior_color: "Black",
        msrp: 56500.0,
        selling_price: 49900.0,
        otd_price: 53700.0,
        rebates: Some(3500.0),
        dealer_name: "Lone Star RAM",
        dealer_location: "Dallas, TX",
        financing: None,
        notes: "Level 1 package, spray-in bedliner.",
    },
    SampleDeal {
        make: "Toyota",
        model: "Camry",
        year: 2024,
        trim: "SE",
        exterior_color: "Celestial Silver",
        interior_color: "Black",
        msrp: 30450.0,
        selling_price: 28900.0,
        otd_price: 31500.0,
        rebates: None,
        dealer_name: "Sunrise Toyota",
        dealer_location: "Long Island, NY",
        financing: Some(SampleFinancing {
            rate: 3.9,
            term: 60,
            down_payment: 2000.0,
            monthly_payment: 470.0,
        }),
        notes: "Included window tint.",
    },
    SampleDeal {
        make: "BMW",
        model: "X3",
        year: 2024,
        trim: "xDrive30i",
        exterior_color: "Alpine White",
        interior_color: "Cognac",
        msrp: 50900.0,
        selling_price: 48500.0,
        otd_price: 52500.0,
        rebates: Some(1250.0),
        dealer_name: "Bavarian BMW",
        dealer_location: "San Jose, CA",
        financing: None,
        notes: "Premium package; 36/10K lease quote was $639/mo with $3K DAS.",
    },
    SampleDeal {
        make: "BMW",
        model: "230i",
        year: 2023,
        trim: "RWD",
        exterior_color: "Brooklyn Grey",
        interior_color: "Black",
        msrp: 38795.0,
        selling_price: 36900.0,
        otd_price: 40100.0,
        rebates: Some(750.0),
        dealer_name: "Metro BMW",
        dealer_location: "Chicago, IL",
        financing: None,
        notes: "Driver Assistance + Moonroof.",
    },
];

impl SampleDeal {
    fn to_new_deal(self, make_id: String, model_id: String) -> NewDeal {
        let financing = self.financing;
        NewDeal {
            user_id: GUEST_USER_ID.to_string(),
            make_id,
            model_id,
            year: self.year,
            trim: Some(self.trim.to_string()),
            exterior_color: Some(self.exterior_color.to_string()),
            interior_color: Some(self.interior_color.to_string()),
            msrp: dollars_to_cents(self.msrp),
            selling_price: dollars_to_cents(self.selling_price),
            otd_price: Some(dollars_to_cents(self.otd_price)),
            rebates: self.rebates.map(dollars_to_cents),
            down_payment: financing.map(|f| dollars_to_cents(f.down_payment)),
            monthly_payment: financing.map(|f| dollars_to_cents(f.monthly_payment)),
            dealer_name: Some(self.dealer_name.to_string()),
            dealer_location: Some(self.dealer_location.to_string()),
            deal_date: Utc::now(),
            financing_rate: financing.map(|f| f.rate),
            financing_term: financing.map(|f| f.term),
            notes: Some(self.notes.to_string()),
            is_leased: false,
            lease_term_months: None,
            mileage_allowance: None,
            is_public: true,
            guest_id: Some(SAMPLE_GUEST_ID.to_string()),
            guest_ip_hash: None,
        }
    }
}

/// Inserts the sample reports under the guest owner, creating any make or
/// model they reference. Returns the new deal IDs.
pub async fn seed_sample_deals<S: DealStore + ?Sized>(store: &S) -> StoreResult<Vec<String>> {
    store.ensure_deal_columns().await?;
    store.ensure_guest_user().await?;

    let mut ids = Vec::with_capacity(SAMPLE_DEALS.len());
    for sample in SAMPLE_DEALS {
        let make = store.upsert_make_by_name(sample.make).await?;
        let model = store.upsert_model_by_name(&make.id, sample.model).await?;
        let deal = store
            .create_deal(sample.to_new_deal(make.id, model.id))
            .await?;
        ids.push(deal.deal.id);
    }
    tracing::info!(inserted = ids.len(), "Seeded sample deals");
    Ok(ids)
}
