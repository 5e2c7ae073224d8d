use farewatch_shared::{FilterSpec, Offer};

/// Apply a filter spec to a result set.
///
/// An offer is kept only when it passes every constrained predicate. The
/// result preserves input order and contains clones of the kept offers.
pub fn filter_offers(offers: &[Offer], spec: &FilterSpec) -> Vec<Offer> {
    if spec.is_unconstrained() {
        return offers.to_vec();
    }

    offers
        .iter()
        .filter(|offer| matches(offer, spec))
        .cloned()
        .collect()
}

pub fn matches(offer: &Offer, spec: &FilterSpec) -> bool {
    matches_stops(offer, spec) && matches_price(offer, spec) && matches_airlines(offer, spec)
}

// Non-stop, one-stop and two-plus are disjoint buckets keyed on the worst leg
fn matches_stops(offer: &Offer, spec: &FilterSpec) -> bool {
    match spec.stops {
        Some(stops) => offer.max_stops() == stops,
        None => true,
    }
}

fn matches_price(offer: &Offer, spec: &FilterSpec) -> bool {
    match spec.max_price {
        Some(ceiling) => offer.price.amount <= ceiling,
        None => true,
    }
}

fn matches_airlines(offer: &Offer, spec: &FilterSpec) -> bool {
    spec.airlines.is_empty() || spec.airlines.iter().any(|code| offer.is_validated_by(code))
}
