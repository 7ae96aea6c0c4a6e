use std::collections::HashMap;
use std::fmt::{self, Display};

use crate::http::request::interpolate;
use crate::schema::{Schema, resources};

/// Static description of one REST collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointDescriptor {
    pub resource_name: &'static str,
    pub base_path: &'static str,
    pub id_field: &'static str,
    /// Size of the seeded collection on the reference backend.
    pub known_count: usize,
}

impl EndpointDescriptor {
    pub fn item_path(&self, id: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("base", self.base_path.to_string());
        vars.insert("id", id.to_string());
        interpolate("{{base}}/{{id}}", &vars)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Post,
    User,
    Comment,
    Album,
    Photo,
}

const POSTS: EndpointDescriptor = EndpointDescriptor {
    resource_name: "post",
    base_path: "/posts",
    id_field: "id",
    known_count: 100,
};

const USERS: EndpointDescriptor = EndpointDescriptor {
    resource_name: "user",
    base_path: "/users",
    id_field: "id",
    known_count: 10,
};

const COMMENTS: EndpointDescriptor = EndpointDescriptor {
    resource_name: "comment",
    base_path: "/comments",
    id_field: "id",
    known_count: 500,
};

const ALBUMS: EndpointDescriptor = EndpointDescriptor {
    resource_name: "album",
    base_path: "/albums",
    id_field: "id",
    known_count: 100,
};

const PHOTOS: EndpointDescriptor = EndpointDescriptor {
    resource_name: "photo",
    base_path: "/photos",
    id_field: "id",
    known_count: 5000,
};

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Post,
        ResourceKind::User,
        ResourceKind::Comment,
        ResourceKind::Album,
        ResourceKind::Photo,
    ];

    pub fn descriptor(self) -> &'static EndpointDescriptor {
        match self {
            ResourceKind::Post => &POSTS,
            ResourceKind::User => &USERS,
            ResourceKind::Comment => &COMMENTS,
            ResourceKind::Album => &ALBUMS,
            ResourceKind::Photo => &PHOTOS,
        }
    }

    pub fn schema(self) -> &'static Schema {
        match self {
            ResourceKind::Post => &*resources::POST,
            ResourceKind::User => &*resources::USER,
            ResourceKind::Comment => &*resources::COMMENT,
            ResourceKind::Album => &*resources::ALBUM,
            ResourceKind::Photo => &*resources::PHOTO,
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.descriptor().resource_name)
    }
}
