identity_adapter!(v1_20_r2, JsonText, "Identity adapter for 1.20.2.");
