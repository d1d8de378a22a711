//! Row ⇄ domain conversions for the relational backend.

use sea_orm::Set;

use models::{Amenity, City, Meta, Place, Review, State, User};

use super::entities::{amenity, city, place, place_amenity, review, state, user};

fn meta_from(id: String, created_at: chrono::NaiveDateTime, updated_at: chrono::NaiveDateTime) -> Meta {
    Meta { id, created_at, updated_at }
}

pub(super) fn state_from_row(row: state::Model) -> State {
    State {
        meta: meta_from(row.id, row.created_at, row.updated_at),
        name: row.name,
    }
}

pub(super) fn state_active(s: &State) -> state::ActiveModel {
    state::ActiveModel {
        id: Set(s.meta.id.clone()),
        name: Set(s.name.clone()),
        created_at: Set(s.meta.created_at),
        updated_at: Set(s.meta.updated_at),
    }
}

pub(super) fn city_from_row(row: city::Model) -> City {
    City {
        meta: meta_from(row.id, row.created_at, row.updated_at),
        state_id: row.state_id,
        name: row.name,
    }
}

pub(super) fn city_active(c: &City) -> city::ActiveModel {
    city::ActiveModel {
        id: Set(c.meta.id.clone()),
        state_id: Set(c.state_id.clone()),
        name: Set(c.name.clone()),
        created_at: Set(c.meta.created_at),
        updated_at: Set(c.meta.updated_at),
    }
}

pub(super) fn user_from_row(row: user::Model) -> User {
    User::from_stored(
        meta_from(row.id, row.created_at, row.updated_at),
        row.email,
        row.password,
        row.first_name,
        row.last_name,
    )
}

pub(super) fn user_active(u: &User) -> user::ActiveModel {
    user::ActiveModel {
        id: Set(u.meta.id.clone()),
        email: Set(u.email.clone()),
        password: Set(u.password_hash().to_string()),
        first_name: Set(u.first_name.clone()),
        last_name: Set(u.last_name.clone()),
        created_at: Set(u.meta.created_at),
        updated_at: Set(u.meta.updated_at),
    }
}

pub(super) fn amenity_from_row(row: amenity::Model) -> Amenity {
    Amenity {
        meta: meta_from(row.id, row.created_at, row.updated_at),
        name: row.name,
    }
}

pub(super) fn amenity_active(a: &Amenity) -> amenity::ActiveModel {
    amenity::ActiveModel {
        id: Set(a.meta.id.clone()),
        name: Set(a.name.clone()),
        created_at: Set(a.meta.created_at),
        updated_at: Set(a.meta.updated_at),
    }
}

/// `amenity_ids` comes from the link table, loaded separately by `all`.
pub(super) fn place_from_row(row: place::Model, amenity_ids: Vec<String>) -> Place {
    Place {
        meta: meta_from(row.id, row.created_at, row.updated_at),
        city_id: row.city_id,
        user_id: row.user_id,
        name: row.name,
        description: row.description,
        number_rooms: row.number_rooms,
        number_bathrooms: row.number_bathrooms,
        max_guest: row.max_guest,
        price_by_night: row.price_by_night,
        latitude: row.latitude,
        longitude: row.longitude,
        amenity_ids,
    }
}

pub(super) fn place_active(p: &Place) -> place::ActiveModel {
    place::ActiveModel {
        id: Set(p.meta.id.clone()),
        city_id: Set(p.city_id.clone()),
        user_id: Set(p.user_id.clone()),
        name: Set(p.name.clone()),
        description: Set(p.description.clone()),
        number_rooms: Set(p.number_rooms),
        number_bathrooms: Set(p.number_bathrooms),
        max_guest: Set(p.max_guest),
        price_by_night: Set(p.price_by_night),
        latitude: Set(p.latitude),
        longitude: Set(p.longitude),
        created_at: Set(p.meta.created_at),
        updated_at: Set(p.meta.updated_at),
    }
}

pub(super) fn amenity_link_rows(p: &Place) -> Vec<place_amenity::ActiveModel> {
    p.amenity_ids
        .iter()
        .map(|aid| place_amenity::ActiveModel {
            place_id: Set(p.meta.id.clone()),
            amenity_id: Set(aid.clone()),
        })
        .collect()
}

pub(super) fn review_from_row(row: review::Model) -> Review {
    Review {
        meta: meta_from(row.id, row.created_at, row.updated_at),
        place_id: row.place_id,
        user_id: row.user_id,
        text: row.text,
    }
}

pub(super) fn review_active(r: &Review) -> review::ActiveModel {
    review::ActiveModel {
        id: Set(r.meta.id.clone()),
        place_id: Set(r.place_id.clone()),
        user_id: Set(r.user_id.clone()),
        text: Set(r.text.clone()),
        created_at: Set(r.meta.created_at),
        updated_at: Set(r.meta.updated_at),
    }
}
