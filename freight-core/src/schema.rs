use diesel::table;

table! {
    trucks (id) {
        id -> Uuid,
        owner_id -> Uuid,
        #[max_length = 50]
        registration_number -> Varchar,
        #[max_length = 100]
        make -> Varchar,
        #[max_length = 100]
        model -> Varchar,
        year -> Int4,
        capacity_kg -> Numeric,
        capacity_cubic_meters -> Numeric,
        length -> Nullable<Numeric>,
        width -> Nullable<Numeric>,
        height -> Nullable<Numeric>,
        truck_type -> Int4,
        status -> Int4,
        license_plate_image_url -> Nullable<Text>,
        registration_document_url -> Nullable<Text>,
        photos -> Nullable<Text>,
        is_verified -> Bool,
        notes -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    users (id) {
        id -> Uuid,
        #[max_length = 256]
        user_name -> Varchar,
        #[max_length = 256]
        normalized_user_name -> Varchar,
        #[max_length = 256]
        email -> Nullable<Varchar>,
        #[max_length = 256]
        normalized_email -> Nullable<Varchar>,
        email_confirmed -> Bool,
        password_hash -> Nullable<Text>,
        security_stamp -> Text,
        concurrency_stamp -> Text,
        phone_number -> Nullable<Text>,
        phone_number_confirmed -> Bool,
        lockout_end -> Nullable<Timestamptz>,
        lockout_enabled -> Bool,
        access_failed_count -> Int4,
        full_name -> Text,
        #[max_length = 32]
        role -> Varchar,
        rating -> Nullable<Float8>,
        rating_count -> Int4,
        rating_total -> Float8,
        registration_date -> Timestamptz,
        last_login_date -> Nullable<Timestamptz>,
        #[max_length = 32]
        account_status -> Varchar,
        profile_picture_url -> Nullable<Text>,
        has_verified_truck -> Bool,
        last_password_change_date -> Nullable<Timestamptz>,
        email_notifications_enabled -> Bool,
        sms_notifications_enabled -> Bool,
        push_notifications_enabled -> Bool,
        #[max_length = 10]
        preferred_language -> Varchar,
    }
}

table! {
    refresh_tokens (id) {
        id -> Uuid,
        user_id -> Uuid,
        token -> Text,
        jwt_id -> Text,
        is_used -> Bool,
        is_revoked -> Bool,
        added_date -> Timestamptz,
        expiry_date -> Timestamptz,
    }
}
