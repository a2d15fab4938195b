table! {
    users (id) {
        id -> Int4,
        name -> Text,
        password -> Text,
        image_url -> Nullable<Text>,
        friend_count -> Int4,
        created_at -> Timestamptz,
    }
}

table! {
    use crate::datastore::structs::CredentialTypeMapping;
    #[allow(unused_imports)]
    use diesel::sql_types::*;
    user_credentials (id) {
        id -> Int4,
        user_id -> Int4,
        credential_type -> CredentialTypeMapping,
        credential_value -> Text,
    }
}

table! {
    relationships (user_first_id, user_second_id) {
        user_first_id -> Int4,
        user_second_id -> Int4,
    }
}

table! {
    posts (id) {
        id -> Int4,
        html -> Text,
        tags -> Array<Text>,
        user_id -> Int4,
        created_at -> Timestamptz,
    }
}

table! {
    comments (id) {
        id -> Int4,
        comment -> Text,
        post_id -> Int4,
        user_id -> Int4,
        created_at -> Timestamptz,
    }
}

joinable!(user_credentials -> users (user_id));
joinable!(posts -> users (user_id));
joinable!(comments -> posts (post_id));
allow_tables_to_appear_in_same_query!(users, user_credentials, relationships, posts, comments);
