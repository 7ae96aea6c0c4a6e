//! Expectation schemas for the five resource kinds.

use std::sync::LazyLock;

use super::{FieldSpec, FieldType, Format, Schema};

pub static POST: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new("post")
        .field(FieldSpec::required("userId", FieldType::Integer).format(Format::Positive))
        .field(FieldSpec::required("id", FieldType::Integer))
        .field(FieldSpec::required("title", FieldType::String).format(Format::NonEmpty))
        .field(FieldSpec::required("body", FieldType::String).format(Format::NonEmpty))
});

pub static USER: LazyLock<Schema> = LazyLock::new(|| {
    let geo = Schema::new("geo")
        .field(FieldSpec::required("lat", FieldType::String))
        .field(FieldSpec::required("lng", FieldType::String));

    let address = Schema::new("address")
        .field(FieldSpec::required("street", FieldType::String))
        .field(FieldSpec::required("suite", FieldType::String))
        .field(FieldSpec::required("city", FieldType::String))
        .field(FieldSpec::required("zipcode", FieldType::String))
        .field(FieldSpec::required("geo", FieldType::Object).nested(geo));

    let company = Schema::new("company")
        .field(FieldSpec::required("name", FieldType::String))
        .field(FieldSpec::required("catchPhrase", FieldType::String))
        .field(FieldSpec::required("bs", FieldType::String));

    Schema::new("user")
        .field(FieldSpec::required("id", FieldType::Integer))
        .field(FieldSpec::required("name", FieldType::String))
        .field(FieldSpec::required("username", FieldType::String))
        .field(FieldSpec::required("email", FieldType::String).format(Format::Email))
        .field(FieldSpec::required("address", FieldType::Object).nested(address))
        .field(FieldSpec::required("phone", FieldType::String))
        .field(FieldSpec::required("website", FieldType::String))
        .field(FieldSpec::required("company", FieldType::Object).nested(company))
});

pub static COMMENT: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new("comment")
        .field(FieldSpec::required("postId", FieldType::Integer).format(Format::Positive))
        .field(FieldSpec::required("id", FieldType::Integer))
        .field(FieldSpec::required("name", FieldType::String))
        .field(FieldSpec::required("email", FieldType::String).format(Format::Email))
        .field(FieldSpec::required("body", FieldType::String))
});

pub static ALBUM: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new("album")
        .field(FieldSpec::required("userId", FieldType::Integer).format(Format::Positive))
        .field(FieldSpec::required("id", FieldType::Integer))
        .field(FieldSpec::required("title", FieldType::String))
});

pub static PHOTO: LazyLock<Schema> = LazyLock::new(|| {
    Schema::new("photo")
        .field(FieldSpec::required("albumId", FieldType::Integer).format(Format::Positive))
        .field(FieldSpec::required("id", FieldType::Integer))
        .field(FieldSpec::required("title", FieldType::String))
        .field(FieldSpec::required("url", FieldType::String).format(Format::Url))
        .field(FieldSpec::required("thumbnailUrl", FieldType::String).format(Format::Url))
});

/// Minimal shape of a create response: a generated integer id.
pub static CREATED: LazyLock<Schema> =
    LazyLock::new(|| Schema::new("created").field(FieldSpec::required("id", FieldType::Integer)));
