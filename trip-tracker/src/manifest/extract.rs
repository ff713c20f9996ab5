//! Turning manifest rows into passenger records.
//!
//! Ship and harbour are stated once per sheet, so each sheet is read with
//! its own [`SheetContext`]. The context is created when a sheet starts and
//! dropped when it ends; nothing carries over from one sheet to the next.

use tracing::{debug, info, warn};

use crate::domain::{CompanyId, IngestionStatus, Passenger, PickupTime, Ship, normalize_place};
use crate::store::{PassengerQuery, Store};

use super::document::{ManifestDocument, ManifestRow, ManifestSheet};
use super::error::ExtractError;

/// Placeholder left in the ship cell of an unfilled manifest template.
const PLACEHOLDER_SHIP: &str = "ships name";

/// Per-sheet extraction state.
#[derive(Debug, Clone)]
pub struct SheetContext {
    sheet: String,
    ship: Ship,
    harbour: String,
}

impl SheetContext {
    /// Start reading `sheet` on behalf of `company`.
    ///
    /// The sheet's ship is looked up by name and registered to `company` if
    /// it is new. A ship that belongs to another company is refused.
    pub fn open<S: Store>(
        sheet: &ManifestSheet,
        company: CompanyId,
        store: &mut S,
    ) -> Result<Self, ExtractError> {
        let name = sheet.ship.trim();
        if name.is_empty() || name.eq_ignore_ascii_case(PLACEHOLDER_SHIP) {
            return Err(ExtractError::MissingShipName);
        }

        let harbour = sheet
            .harbour
            .as_deref()
            .map(normalize_place)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ExtractError::MissingHarbour {
                sheet: sheet.name.clone(),
            })?;

        let ship = match store.find_ship(name)? {
            Some(ship) if ship.organizer_company == company => ship,
            Some(_) => {
                return Err(ExtractError::ForeignShip {
                    ship: name.to_string(),
                });
            }
            None => {
                info!(ship = name, %company, "registering new ship");
                store.save_ship(Ship::new(name, company))?
            }
        };

        Ok(Self {
            sheet: sheet.name.clone(),
            ship,
            harbour,
        })
    }

    pub fn ship(&self) -> &Ship {
        &self.ship
    }

    /// Normalised harbour name.
    pub fn harbour(&self) -> &str {
        &self.harbour
    }

    /// Resolve a pickup or destination cell: "hotel" means the hotel
    /// column, "ship" means the harbour.
    fn place(&self, cell: &str, hotel: Option<&str>) -> String {
        let cell = cell.trim();
        if cell.eq_ignore_ascii_case("hotel")
            && let Some(hotel) = hotel.filter(|h| !h.trim().is_empty())
        {
            return normalize_place(hotel);
        }
        if cell.replace(' ', "").eq_ignore_ascii_case("ship") {
            return self.harbour.clone();
        }
        normalize_place(cell)
    }
}

fn text(cell: &Option<String>) -> Option<String> {
    cell.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Extract one passenger record from a row.
///
/// Returns `Ok(None)` for rows without a first name or surname. Field
/// problems are recorded on the record; a missing pickup time, pickup
/// location or destination also marks it invalid.
pub fn extract_row<S: Store>(
    context: &SheetContext,
    row: &ManifestRow,
    store: &S,
) -> Result<Option<Passenger>, ExtractError> {
    let (Some(first_name), Some(surname)) = (text(&row.first_name), text(&row.surname)) else {
        return Ok(None);
    };

    let mut pax = Passenger::new(first_name, surname).with_ingestion(row.marker.ingestion());
    pax.flight = text(&row.flight);
    pax.organization = text(&row.organization);
    pax.remarks = text(&row.remarks);
    pax.harbour = Some(context.harbour.clone());
    pax.ship = context.ship.id;

    match (text(&row.date), text(&row.time)) {
        (Some(date), Some(time)) => match PickupTime::from_parts(&date, &time) {
            Ok(pickup) => pax.pickup_time = Some(pickup),
            Err(e) => {
                debug!(sheet = %context.sheet, error = %e, "unparseable pickup time");
                pax.invalidate("Error in pick up time");
            }
        },
        _ => pax.invalidate("Error in pick up time"),
    }

    pax.immigration = row
        .immigration
        .as_deref()
        .is_some_and(|s| s.replace(' ', "").eq_ignore_ascii_case("yes"));

    if let Some(po) = &row.po {
        match po.value() {
            Some(n) => pax.po_number = Some(n),
            None => pax.annotate("Error in PO field"),
        }
    }

    match text(&row.pickup_location) {
        Some(cell) => pax.pickup_location = context.place(&cell, row.hotel.as_deref()),
        None => pax.invalidate("Error in pick up location"),
    }
    match text(&row.destination) {
        Some(cell) => pax.destination = context.place(&cell, row.hotel.as_deref()),
        None => pax.invalidate("Error in destination"),
    }

    match pax.ingestion {
        IngestionStatus::Cancel => {
            let exists = match PassengerQuery::exact(&pax) {
                Some(query) => !store.passengers_matching(&query)?.is_empty(),
                None => false,
            };
            if !exists {
                pax.invalidate("Passenger does not exist");
            }
        }
        IngestionStatus::Change => {
            let by_time = match PassengerQuery::name_and_time(&pax) {
                Some(query) => !store.passengers_matching(&query)?.is_empty(),
                None => false,
            };
            let by_route = !store
                .passengers_matching(&PassengerQuery::name_and_route(&pax))?
                .is_empty();
            if !by_time && !by_route {
                pax.annotate("Passenger does not exist");
            }
        }
        IngestionStatus::Add => {}
    }

    Ok(Some(pax))
}

/// Records extracted from a whole document.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub records: Vec<Passenger>,
    /// The last PO number seen in the document.
    pub po_number: Option<u64>,
}

/// Extract every passenger record from `document`.
///
/// Hotel sheets are skipped. A sheet whose ship or harbour cannot be
/// established is logged and skipped; the other sheets are still read.
pub fn extract_document<S: Store>(
    document: &ManifestDocument,
    company: CompanyId,
    store: &mut S,
) -> Extraction {
    let mut extraction = Extraction::default();

    for sheet in &document.sheets {
        if sheet.name.to_lowercase().contains("hotel") {
            debug!(sheet = %sheet.name, "skipping hotel sheet");
            continue;
        }

        let context = match SheetContext::open(sheet, company, store) {
            Ok(context) => context,
            Err(e) => {
                warn!(sheet = %sheet.name, error = %e, "skipping sheet");
                continue;
            }
        };

        for (index, row) in sheet.rows.iter().enumerate() {
            match extract_row(&context, row, store) {
                Ok(Some(pax)) => {
                    if pax.po_number.is_some() {
                        extraction.po_number = pax.po_number;
                    }
                    extraction.records.push(pax);
                }
                Ok(None) => {}
                Err(e) => warn!(sheet = %sheet.name, row = index, error = %e, "failed to read row"),
            }
        }
    }

    info!(
        records = extraction.records.len(),
        po = ?extraction.po_number,
        "extracted manifest"
    );
    extraction
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OrganizerCompany, TripStatus};
    use crate::manifest::RowMarker;
    use crate::manifest::document::PoCell;
    use crate::store::MemoryStore;

    fn store_with_company() -> (MemoryStore, CompanyId) {
        let mut store = MemoryStore::new();
        let company = store.save_company(OrganizerCompany::new("Fjord Cruises")).unwrap();
        (store, company.id.unwrap())
    }

    fn sheet(rows: Vec<ManifestRow>) -> ManifestSheet {
        ManifestSheet {
            name: "Crew".into(),
            ship: "Aurora".into(),
            harbour: Some("Stavanger Harbour".into()),
            rows,
        }
    }

    fn row(first: &str, surname: &str) -> ManifestRow {
        ManifestRow {
            first_name: Some(first.into()),
            surname: Some(surname.into()),
            date: Some("2024-06-01".into()),
            time: Some("09:00".into()),
            pickup_location: Some("Pier A".into()),
            destination: Some("Downtown".into()),
            po: Some(PoCell::Number(17)),
            ..Default::default()
        }
    }

    #[test]
    fn open_registers_new_ship() {
        let (mut store, company) = store_with_company();
        let ctx = SheetContext::open(&sheet(vec![]), company, &mut store).unwrap();
        assert_eq!(ctx.ship().organizer_company, company);
        assert!(ctx.ship().id.is_some());
        assert_eq!(ctx.harbour(), "stavanger harbour");
        assert!(store.find_ship("aurora").unwrap().is_some());
    }

    #[test]
    fn open_rejects_placeholder_ship() {
        let (mut store, company) = store_with_company();
        let mut s = sheet(vec![]);
        s.ship = "Ships Name".into();
        let err = SheetContext::open(&s, company, &mut store).unwrap_err();
        assert!(matches!(err, ExtractError::MissingShipName));
    }

    #[test]
    fn open_rejects_foreign_ship() {
        let (mut store, company) = store_with_company();
        let other = store.save_company(OrganizerCompany::new("Other")).unwrap();
        store.save_ship(Ship::new("Aurora", other.id.unwrap())).unwrap();

        let err = SheetContext::open(&sheet(vec![]), company, &mut store).unwrap_err();
        assert!(matches!(err, ExtractError::ForeignShip { .. }));
    }

    #[test]
    fn open_requires_harbour() {
        let (mut store, company) = store_with_company();
        let mut s = sheet(vec![]);
        s.harbour = None;
        let err = SheetContext::open(&s, company, &mut store).unwrap_err();
        assert!(matches!(err, ExtractError::MissingHarbour { .. }));
    }

    #[test]
    fn extract_complete_row() {
        let (mut store, company) = store_with_company();
        let mut r = row("Alice", "Smith");
        r.immigration = Some(" Y es ".into());
        let ctx = SheetContext::open(&sheet(vec![]), company, &mut store).unwrap();

        let pax = extract_row(&ctx, &r, &store).unwrap().unwrap();
        assert!(pax.valid);
        assert_eq!(pax.error, None);
        assert_eq!(pax.ingestion, IngestionStatus::Add);
        assert_eq!(pax.pickup_time, Some(PickupTime::parse("2024-06-01 09:00").unwrap()));
        assert_eq!(pax.pickup_location, "pier a");
        assert_eq!(pax.po_number, Some(17));
        assert_eq!(pax.ship, ctx.ship().id);
        assert!(pax.immigration);
        assert!(pax.has_required_fields());
    }

    #[test]
    fn rows_without_names_are_skipped() {
        let (mut store, company) = store_with_company();
        let ctx = SheetContext::open(&sheet(vec![]), company, &mut store).unwrap();
        let mut r = row("Alice", "Smith");
        r.surname = Some("  ".into());
        assert!(extract_row(&ctx, &r, &store).unwrap().is_none());
    }

    #[test]
    fn bad_time_invalidates() {
        let (mut store, company) = store_with_company();
        let ctx = SheetContext::open(&sheet(vec![]), company, &mut store).unwrap();
        let mut r = row("Alice", "Smith");
        r.time = Some("soon".into());

        let pax = extract_row(&ctx, &r, &store).unwrap().unwrap();
        assert!(!pax.valid);
        assert_eq!(pax.error.as_deref(), Some("Error in pick up time"));
    }

    #[test]
    fn bad_po_is_annotated_but_valid() {
        let (mut store, company) = store_with_company();
        let ctx = SheetContext::open(&sheet(vec![]), company, &mut store).unwrap();
        let mut r = row("Alice", "Smith");
        r.po = Some(PoCell::Text("tbd".into()));

        let pax = extract_row(&ctx, &r, &store).unwrap().unwrap();
        assert!(pax.valid);
        assert_eq!(pax.po_number, None);
        assert_eq!(pax.error.as_deref(), Some("Error in PO field"));
    }

    #[test]
    fn hotel_and_ship_cells_are_substituted() {
        let (mut store, company) = store_with_company();
        let ctx = SheetContext::open(&sheet(vec![]), company, &mut store).unwrap();
        let mut r = row("Alice", "Smith");
        r.pickup_location = Some("Hotel".into());
        r.hotel = Some("Grand Hotel".into());
        r.destination = Some("S hip".into());

        let pax = extract_row(&ctx, &r, &store).unwrap().unwrap();
        assert_eq!(pax.pickup_location, "grand hotel");
        assert_eq!(pax.destination, "stavanger harbour");
    }

    #[test]
    fn cancel_of_unknown_passenger_is_invalid() {
        let (mut store, company) = store_with_company();
        let ctx = SheetContext::open(&sheet(vec![]), company, &mut store).unwrap();
        let mut r = row("Alice", "Smith");
        r.marker = RowMarker::Red;

        let pax = extract_row(&ctx, &r, &store).unwrap().unwrap();
        assert_eq!(pax.ingestion, IngestionStatus::Cancel);
        assert!(!pax.valid);
        assert_eq!(pax.error.as_deref(), Some("Passenger does not exist"));
    }

    #[test]
    fn cancel_of_known_passenger_is_valid() {
        let (mut store, company) = store_with_company();
        let ctx = SheetContext::open(&sheet(vec![]), company, &mut store).unwrap();
        let existing = extract_row(&ctx, &row("Alice", "Smith"), &store).unwrap().unwrap();
        store.save_passenger(existing).unwrap();

        let mut r = row("Alice", "Smith");
        r.marker = RowMarker::Red;
        let pax = extract_row(&ctx, &r, &store).unwrap().unwrap();
        assert!(pax.valid);
        assert_eq!(pax.status, TripStatus::Created);
    }

    #[test]
    fn change_of_unknown_passenger_is_annotated() {
        let (mut store, company) = store_with_company();
        let ctx = SheetContext::open(&sheet(vec![]), company, &mut store).unwrap();
        let mut r = row("Alice", "Smith");
        r.marker = RowMarker::Yellow;

        let pax = extract_row(&ctx, &r, &store).unwrap().unwrap();
        assert!(pax.valid);
        assert_eq!(pax.error.as_deref(), Some("Passenger does not exist"));
    }

    #[test]
    fn document_skips_hotel_and_broken_sheets() {
        let (mut store, company) = store_with_company();
        let mut second = row("Bob", "Lee");
        second.po = Some(PoCell::Number(18));
        let good = sheet(vec![row("Alice", "Smith"), second]);

        let mut hotel = sheet(vec![row("Carol", "King")]);
        hotel.name = "Hotel list".into();

        let mut broken = sheet(vec![row("Dan", "Brown")]);
        broken.name = "Guests".into();
        broken.ship = "ships name".into();

        let doc = ManifestDocument {
            sheets: vec![hotel, good, broken],
        };
        let extraction = extract_document(&doc, company, &mut store);

        let names: Vec<_> = extraction.records.iter().map(|p| p.first_name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob"]);
        assert_eq!(extraction.po_number, Some(18));
    }
}
