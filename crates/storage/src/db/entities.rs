//! Row types for the relational backend. These mirror the migration
//! schema; mapping to and from domain entities lives in `map`.

pub mod state {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "states")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub name: String,
        pub created_at: DateTime,
        pub updated_at: DateTime,
    }

    #[derive(Copy, Clone, Debug, EnumIter)]
    pub enum Relation {
        Cities,
    }

    impl RelationTrait for Relation {
        fn def(&self) -> RelationDef {
            match self {
                Relation::Cities => Entity::has_many(super::city::Entity).into(),
            }
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod city {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "cities")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub state_id: String,
        pub name: String,
        pub created_at: DateTime,
        pub updated_at: DateTime,
    }

    #[derive(Copy, Clone, Debug, EnumIter)]
    pub enum Relation {
        State,
        Places,
    }

    impl RelationTrait for Relation {
        fn def(&self) -> RelationDef {
            match self {
                Relation::State => Entity::belongs_to(super::state::Entity)
                    .from(Column::StateId)
                    .to(super::state::Column::Id)
                    .into(),
                Relation::Places => Entity::has_many(super::place::Entity).into(),
            }
        }
    }

    impl Related<super::state::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::State.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod user {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub email: String,
        pub password: String,
        pub first_name: Option<String>,
        pub last_name: Option<String>,
        pub created_at: DateTime,
        pub updated_at: DateTime,
    }

    #[derive(Copy, Clone, Debug, EnumIter)]
    pub enum Relation {
        Places,
        Reviews,
    }

    impl RelationTrait for Relation {
        fn def(&self) -> RelationDef {
            match self {
                Relation::Places => Entity::has_many(super::place::Entity).into(),
                Relation::Reviews => Entity::has_many(super::review::Entity).into(),
            }
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod amenity {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "amenities")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub name: String,
        pub created_at: DateTime,
        pub updated_at: DateTime,
    }

    #[derive(Copy, Clone, Debug, EnumIter)]
    pub enum Relation {
        Links,
    }

    impl RelationTrait for Relation {
        fn def(&self) -> RelationDef {
            match self {
                Relation::Links => Entity::has_many(super::place_amenity::Entity).into(),
            }
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod place {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "places")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub city_id: String,
        pub user_id: String,
        pub name: String,
        pub description: Option<String>,
        pub number_rooms: i32,
        pub number_bathrooms: i32,
        pub max_guest: i32,
        pub price_by_night: i32,
        pub latitude: Option<f64>,
        pub longitude: Option<f64>,
        pub created_at: DateTime,
        pub updated_at: DateTime,
    }

    #[derive(Copy, Clone, Debug, EnumIter)]
    pub enum Relation {
        City,
        User,
        Reviews,
        Links,
    }

    impl RelationTrait for Relation {
        fn def(&self) -> RelationDef {
            match self {
                Relation::City => Entity::belongs_to(super::city::Entity)
                    .from(Column::CityId)
                    .to(super::city::Column::Id)
                    .into(),
                Relation::User => Entity::belongs_to(super::user::Entity)
                    .from(Column::UserId)
                    .to(super::user::Column::Id)
                    .into(),
                Relation::Reviews => Entity::has_many(super::review::Entity).into(),
                Relation::Links => Entity::has_many(super::place_amenity::Entity).into(),
            }
        }
    }

    impl Related<super::city::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::City.def()
        }
    }

    impl Related<super::user::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::User.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod review {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "reviews")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: String,
        pub place_id: String,
        pub user_id: String,
        pub text: String,
        pub created_at: DateTime,
        pub updated_at: DateTime,
    }

    #[derive(Copy, Clone, Debug, EnumIter)]
    pub enum Relation {
        Place,
        User,
    }

    impl RelationTrait for Relation {
        fn def(&self) -> RelationDef {
            match self {
                Relation::Place => Entity::belongs_to(super::place::Entity)
                    .from(Column::PlaceId)
                    .to(super::place::Column::Id)
                    .into(),
                Relation::User => Entity::belongs_to(super::user::Entity)
                    .from(Column::UserId)
                    .to(super::user::Column::Id)
                    .into(),
            }
        }
    }

    impl Related<super::place::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Place.def()
        }
    }

    impl Related<super::user::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::User.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod place_amenity {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "place_amenity")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub place_id: String,
        #[sea_orm(primary_key, auto_increment = false)]
        pub amenity_id: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter)]
    pub enum Relation {
        Place,
        Amenity,
    }

    impl RelationTrait for Relation {
        fn def(&self) -> RelationDef {
            match self {
                Relation::Place => Entity::belongs_to(super::place::Entity)
                    .from(Column::PlaceId)
                    .to(super::place::Column::Id)
                    .into(),
                Relation::Amenity => Entity::belongs_to(super::amenity::Entity)
                    .from(Column::AmenityId)
                    .to(super::amenity::Column::Id)
                    .into(),
            }
        }
    }

    impl Related<super::place::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Place.def()
        }
    }

    impl Related<super::amenity::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Amenity.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}
