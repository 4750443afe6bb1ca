identity_adapter!(v1_20_r1, JsonText, "Identity adapter for 1.20 and 1.20.1.");
